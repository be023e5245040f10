//! Transition journal types.
//!
//! Every multi-step transition writes a journal that records each completed
//! sub-step. A transition that fails halfway keeps its completed steps so the
//! recovery service can finish it instead of leaving it half-applied.

use crate::{current_timestamp, OrderStatus, ShipmentDirection};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Orchestrator operations that change an order's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum TransitionKind {
	BeginQuoting,
	SubmitQuotation,
	DraftContract,
	SignContract,
	StartProduction,
	AcceptFreeGuarantee,
	FinishAndShip,
	ConfirmReceipt,
	Cancel,
}

impl fmt::Display for TransitionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			TransitionKind::BeginQuoting => "begin_quoting",
			TransitionKind::SubmitQuotation => "submit_quotation",
			TransitionKind::DraftContract => "draft_contract",
			TransitionKind::SignContract => "sign_contract",
			TransitionKind::StartProduction => "start_production",
			TransitionKind::AcceptFreeGuarantee => "accept_free_guarantee",
			TransitionKind::FinishAndShip => "finish_and_ship",
			TransitionKind::ConfirmReceipt => "confirm_receipt",
			TransitionKind::Cancel => "cancel",
		};
		f.write_str(name)
	}
}

/// A completed sub-step of a transition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum JournalStep {
	ContractDrafted {
		contract_id: String,
	},
	SignatureAttached {
		contract_id: String,
	},
	DepositPlanScheduled {
		total_amount: u64,
	},
	CourierShipmentCreated {
		direction: ShipmentDirection,
		order_code: String,
	},
	CourierSkipped {
		direction: ShipmentDirection,
	},
	OrderCodeRecorded {
		direction: ShipmentDirection,
		order_code: String,
	},
	StatusCommitted {
		status: OrderStatus,
	},
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StepRecord {
	pub step: JournalStep,
	pub completed_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum JournalOutcome {
	/// Still running, or the process stopped mid-transition.
	Pending,
	Committed,
	Failed { error: String },
	/// Closed without committing because the order moved past this transition.
	Abandoned { reason: String },
}

/// Step log of one transition attempt.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionJournal {
	pub id: String,
	pub order_id: String,
	pub transition: TransitionKind,
	pub from_status: OrderStatus,
	pub to_status: OrderStatus,
	pub steps: Vec<StepRecord>,
	pub outcome: JournalOutcome,
	pub created_at: u64,
	pub updated_at: u64,
}

impl TransitionJournal {
	pub fn new(
		id: impl Into<String>,
		order_id: impl Into<String>,
		transition: TransitionKind,
		from_status: OrderStatus,
		to_status: OrderStatus,
	) -> Self {
		let now = current_timestamp();
		Self {
			id: id.into(),
			order_id: order_id.into(),
			transition,
			from_status,
			to_status,
			steps: Vec::new(),
			outcome: JournalOutcome::Pending,
			created_at: now,
			updated_at: now,
		}
	}

	pub fn record(&mut self, step: JournalStep) {
		let now = current_timestamp();
		self.steps.push(StepRecord {
			step,
			completed_at: now,
		});
		self.updated_at = now;
	}

	pub fn commit(&mut self) {
		self.outcome = JournalOutcome::Committed;
		self.updated_at = current_timestamp();
	}

	pub fn fail(&mut self, error: impl Into<String>) {
		self.outcome = JournalOutcome::Failed {
			error: error.into(),
		};
		self.updated_at = current_timestamp();
	}

	pub fn abandon(&mut self, reason: impl Into<String>) {
		self.outcome = JournalOutcome::Abandoned {
			reason: reason.into(),
		};
		self.updated_at = current_timestamp();
	}

	/// Courier order code obtained for `direction` during this transition.
	pub fn courier_code(&self, direction: ShipmentDirection) -> Option<&str> {
		self.steps.iter().find_map(|r| match &r.step {
			JournalStep::CourierShipmentCreated {
				direction: d,
				order_code,
			} if *d == direction => Some(order_code.as_str()),
			_ => None,
		})
	}

	pub fn is_code_recorded(&self, direction: ShipmentDirection) -> bool {
		self.steps.iter().any(|r| {
			matches!(&r.step, JournalStep::OrderCodeRecorded { direction: d, .. } if *d == direction)
		})
	}

	pub fn is_status_committed(&self) -> bool {
		self.steps
			.iter()
			.any(|r| matches!(r.step, JournalStep::StatusCommitted { .. }))
	}

	/// True when a courier shipment exists but the transition never committed.
	pub fn needs_resume(&self) -> bool {
		matches!(
			self.outcome,
			JournalOutcome::Pending | JournalOutcome::Failed { .. }
		) && !self.is_status_committed()
			&& self
				.steps
				.iter()
				.any(|r| matches!(r.step, JournalStep::CourierShipmentCreated { .. }))
	}
}
