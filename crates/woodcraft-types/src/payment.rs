//! Deposit and payment plan types.

use serde::{Deserialize, Serialize};

/// Whether a deposit installment has been paid.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DepositStatus {
	Unpaid,
	Paid,
}

/// One installment against a contract total.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Deposit {
	pub id: String,
	pub order_id: String,
	/// Position in the plan, starting at 1 and strictly increasing.
	pub deposit_number: u32,
	pub amount: u64,
	pub percent: u8,
	pub status: DepositStatus,
	pub created_at: u64,
	pub updated_at: u64,
}

impl Deposit {
	pub fn is_paid(&self) -> bool {
		self.status == DepositStatus::Paid
	}
}

/// Append-only deposit sequence for one order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentPlan {
	pub order_id: String,
	pub total_amount: u64,
	pub deposits: Vec<Deposit>,
}

/// Balances recomputed from a deposit sequence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PaymentTotals {
	pub total_amount: u64,
	pub amount_paid: u64,
	pub amount_remaining: u64,
}

impl PaymentTotals {
	/// Sums the paid installments of a plan.
	pub fn from_plan(plan: &PaymentPlan) -> Self {
		let amount_paid: u64 = plan
			.deposits
			.iter()
			.filter(|d| d.is_paid())
			.map(|d| d.amount)
			.sum();
		Self {
			total_amount: plan.total_amount,
			amount_paid,
			amount_remaining: plan.total_amount.saturating_sub(amount_paid),
		}
	}
}
