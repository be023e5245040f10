//! Deposit tracking for the woodcraft orchestrator.
//!
//! Each order with a signed contract owns an append-only deposit plan. The
//! paid and remaining balances are always recomputed from the deposit
//! sequence, never cached.

use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, info};
use woodcraft_storage::{StorageError, StorageService};
use woodcraft_types::{
	current_timestamp, format_vnd, truncate_id, Deposit, DepositStatus, PaymentPlan,
	PaymentTotals, StorageKey, COST_STEP,
};

/// Errors that can occur during payment operations.
#[derive(Debug, Error)]
pub enum PaymentError {
	#[error("Invalid deposit: {0}")]
	Validation(String),
	#[error("No payment plan for order {0}")]
	PlanNotFound(String),
	#[error("Deposit not found: {0}")]
	DepositNotFound(String),
	/// The plan already holds deposits for a different total.
	#[error("Payment plan conflict: {0}")]
	Conflict(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for PaymentError {
	fn from(err: StorageError) -> Self {
		PaymentError::Storage(err.to_string())
	}
}

/// Splits `total` by percent, rounding each installment down to a whole
/// thousand. The last installment takes the remainder, so the parts always
/// add up to `total`. Installments that round to zero are dropped.
pub fn split_installments(total: u64, percents: &[u8]) -> Vec<(u8, u64)> {
	let mut parts = Vec::with_capacity(percents.len());
	let mut allocated = 0u64;
	for (index, percent) in percents.iter().enumerate() {
		let amount = if index + 1 == percents.len() {
			total - allocated
		} else {
			let raw = total.saturating_mul(u64::from(*percent)) / 100;
			let rounded = raw - raw % COST_STEP;
			rounded.min(total - allocated)
		};
		allocated += amount;
		if amount > 0 {
			parts.push((*percent, amount));
		}
	}
	parts
}

/// Append-only deposit plans keyed by order.
pub struct DepositTracker {
	storage: Arc<StorageService>,
	default_schedule: Vec<u8>,
	/// Serializes read-modify-write cycles on plans.
	write_lock: Mutex<()>,
}

impl DepositTracker {
	pub fn new(storage: Arc<StorageService>, default_schedule: Vec<u8>) -> Self {
		Self {
			storage,
			default_schedule,
			write_lock: Mutex::new(()),
		}
	}

	/// Opens the plan of an order, or returns the existing one.
	///
	/// The total of a plan without deposits may still change; once deposits
	/// exist a different total is a conflict.
	pub async fn open_plan(
		&self,
		order_id: &str,
		total_amount: u64,
	) -> Result<PaymentPlan, PaymentError> {
		let _guard = self.write_lock.lock().await;
		self.open_plan_locked(order_id, total_amount).await
	}

	/// Opens the plan and schedules its installments.
	///
	/// Uses the configured schedule unless `percents` is given. Scheduling an
	/// order that already has deposits for the same total returns them as is.
	/// An empty schedule only opens the plan; installments are then added with
	/// [`Self::record_deposit`].
	pub async fn schedule(
		&self,
		order_id: &str,
		total_amount: u64,
		percents: Option<&[u8]>,
	) -> Result<Vec<Deposit>, PaymentError> {
		let percents = percents.unwrap_or(self.default_schedule.as_slice());
		if percents.is_empty() {
			return Ok(self.open_plan(order_id, total_amount).await?.deposits);
		}
		validate_schedule(percents)?;

		let _guard = self.write_lock.lock().await;
		let mut plan = self.open_plan_locked(order_id, total_amount).await?;
		if !plan.deposits.is_empty() {
			return Ok(plan.deposits);
		}

		for (percent, amount) in split_installments(total_amount, percents) {
			let deposit = new_deposit(&plan, amount, percent);
			self.storage
				.store(StorageKey::OrderByDeposit, &deposit.id, &order_id.to_string())
				.await?;
			plan.deposits.push(deposit);
		}
		self.storage
			.store(StorageKey::PaymentPlans, order_id, &plan)
			.await?;

		info!(
			order_id = %truncate_id(order_id),
			total = %format_vnd(total_amount),
			installments = plan.deposits.len(),
			"Deposit plan scheduled"
		);
		Ok(plan.deposits)
	}

	/// Appends one unpaid installment.
	pub async fn record_deposit(
		&self,
		order_id: &str,
		amount: u64,
		percent: u8,
	) -> Result<Deposit, PaymentError> {
		if amount == 0 {
			return Err(PaymentError::Validation("amount must be positive".into()));
		}
		if percent > 100 {
			return Err(PaymentError::Validation(format!(
				"percent {} exceeds 100",
				percent
			)));
		}

		let _guard = self.write_lock.lock().await;
		let mut plan = self.plan(order_id).await?;
		let scheduled: u64 = plan.deposits.iter().map(|d| d.amount).sum();
		if scheduled + amount > plan.total_amount {
			return Err(PaymentError::Validation(format!(
				"scheduled deposits would reach {} of a {} total",
				format_vnd(scheduled + amount),
				format_vnd(plan.total_amount)
			)));
		}

		let deposit = new_deposit(&plan, amount, percent);
		self.storage
			.store(StorageKey::OrderByDeposit, &deposit.id, &order_id.to_string())
			.await?;
		plan.deposits.push(deposit.clone());
		self.storage
			.store(StorageKey::PaymentPlans, order_id, &plan)
			.await?;

		debug!(
			order_id = %truncate_id(order_id),
			deposit_number = deposit.deposit_number,
			amount = %format_vnd(amount),
			"Deposit recorded"
		);
		Ok(deposit)
	}

	/// Marks a deposit paid. Paying a paid deposit changes nothing.
	pub async fn mark_paid(&self, deposit_id: &str) -> Result<Deposit, PaymentError> {
		let order_id = self.order_for_deposit(deposit_id).await?;

		let _guard = self.write_lock.lock().await;
		let mut plan = self.plan(&order_id).await?;
		let deposit = plan
			.deposits
			.iter_mut()
			.find(|d| d.id == deposit_id)
			.ok_or_else(|| PaymentError::DepositNotFound(deposit_id.to_string()))?;
		if deposit.is_paid() {
			return Ok(deposit.clone());
		}

		deposit.status = DepositStatus::Paid;
		deposit.updated_at = current_timestamp();
		let paid = deposit.clone();
		self.storage
			.store(StorageKey::PaymentPlans, &order_id, &plan)
			.await?;

		info!(
			order_id = %truncate_id(&order_id),
			deposit_number = paid.deposit_number,
			amount = %format_vnd(paid.amount),
			"Deposit paid"
		);
		Ok(paid)
	}

	/// Deposits of an order in plan order. Empty when no plan exists.
	pub async fn deposits(&self, order_id: &str) -> Result<Vec<Deposit>, PaymentError> {
		Ok(self
			.storage
			.retrieve_optional::<PaymentPlan>(StorageKey::PaymentPlans, order_id)
			.await?
			.map(|plan| plan.deposits)
			.unwrap_or_default())
	}

	/// Balances recomputed from the deposit sequence.
	pub async fn totals(&self, order_id: &str) -> Result<PaymentTotals, PaymentError> {
		Ok(PaymentTotals::from_plan(&self.plan(order_id).await?))
	}

	/// Order owning a deposit.
	pub async fn order_for_deposit(&self, deposit_id: &str) -> Result<String, PaymentError> {
		self.storage
			.retrieve_optional::<String>(StorageKey::OrderByDeposit, deposit_id)
			.await?
			.ok_or_else(|| PaymentError::DepositNotFound(deposit_id.to_string()))
	}

	async fn plan(&self, order_id: &str) -> Result<PaymentPlan, PaymentError> {
		self.storage
			.retrieve_optional(StorageKey::PaymentPlans, order_id)
			.await?
			.ok_or_else(|| PaymentError::PlanNotFound(order_id.to_string()))
	}

	async fn open_plan_locked(
		&self,
		order_id: &str,
		total_amount: u64,
	) -> Result<PaymentPlan, PaymentError> {
		let existing: Option<PaymentPlan> = self
			.storage
			.retrieve_optional(StorageKey::PaymentPlans, order_id)
			.await?;

		let plan = match existing {
			Some(plan) if plan.total_amount == total_amount => return Ok(plan),
			Some(plan) if !plan.deposits.is_empty() => {
				return Err(PaymentError::Conflict(format!(
					"order {} already has deposits for a {} total",
					order_id,
					format_vnd(plan.total_amount)
				)))
			},
			Some(mut plan) => {
				plan.total_amount = total_amount;
				plan
			},
			None => PaymentPlan {
				order_id: order_id.to_string(),
				total_amount,
				deposits: Vec::new(),
			},
		};
		self.storage
			.store(StorageKey::PaymentPlans, order_id, &plan)
			.await?;
		Ok(plan)
	}
}

fn validate_schedule(percents: &[u8]) -> Result<(), PaymentError> {
	let sum: u32 = percents.iter().map(|p| u32::from(*p)).sum();
	if sum != 100 {
		return Err(PaymentError::Validation(format!(
			"deposit schedule sums to {}, expected 100",
			sum
		)));
	}
	Ok(())
}

fn new_deposit(plan: &PaymentPlan, amount: u64, percent: u8) -> Deposit {
	let now = current_timestamp();
	let next_number = plan
		.deposits
		.last()
		.map(|d| d.deposit_number + 1)
		.unwrap_or(1);
	Deposit {
		id: uuid::Uuid::new_v4().to_string(),
		order_id: plan.order_id.clone(),
		deposit_number: next_number,
		amount,
		percent,
		status: DepositStatus::Unpaid,
		created_at: now,
		updated_at: now,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_storage::implementations::memory::MemoryStorage;

	fn tracker() -> Arc<DepositTracker> {
		Arc::new(DepositTracker::new(
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			vec![30, 70],
		))
	}

	#[test]
	fn test_split_rounds_down_and_keeps_remainder_last() {
		assert_eq!(
			split_installments(730_000, &[30, 70]),
			vec![(30, 219_000), (70, 511_000)]
		);
		assert_eq!(
			split_installments(1_001_500, &[30, 30, 40]),
			vec![(30, 300_000), (30, 300_000), (40, 401_500)]
		);
		assert_eq!(split_installments(500, &[30, 70]), vec![(70, 500)]);
		assert!(split_installments(0, &[30, 70]).is_empty());
	}

	#[tokio::test]
	async fn test_schedule_and_totals() {
		let tracker = tracker();
		let deposits = tracker.schedule("o1", 730_000, None).await.unwrap();
		assert_eq!(deposits.len(), 2);
		assert_eq!(deposits[0].deposit_number, 1);
		assert_eq!(deposits[1].deposit_number, 2);

		let totals = tracker.totals("o1").await.unwrap();
		assert_eq!(totals.amount_paid, 0);
		assert_eq!(totals.amount_remaining, 730_000);

		tracker.mark_paid(&deposits[0].id).await.unwrap();
		let totals = tracker.totals("o1").await.unwrap();
		assert_eq!(totals.amount_paid, 219_000);
		assert_eq!(totals.amount_remaining, 511_000);

		// Scheduling again returns the same installments
		let again = tracker.schedule("o1", 730_000, None).await.unwrap();
		assert_eq!(again.len(), 2);
		assert_eq!(again[0].id, deposits[0].id);
	}

	#[tokio::test]
	async fn test_empty_schedule_only_opens_plan() {
		let tracker = Arc::new(DepositTracker::new(
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Vec::new(),
		));
		assert!(tracker.schedule("o1", 500_000, None).await.unwrap().is_empty());
		assert_eq!(tracker.totals("o1").await.unwrap().amount_remaining, 500_000);

		let deposit = tracker.record_deposit("o1", 200_000, 40).await.unwrap();
		assert_eq!(deposit.deposit_number, 1);
		assert!(matches!(
			tracker.schedule("o1", 500_000, Some(&[30, 60])).await,
			Err(PaymentError::Validation(_))
		));
	}

	#[tokio::test]
	async fn test_mark_paid_is_idempotent() {
		let tracker = tracker();
		tracker.open_plan("o1", 1_000_000).await.unwrap();
		let deposit = tracker.record_deposit("o1", 400_000, 40).await.unwrap();

		let first = tracker.mark_paid(&deposit.id).await.unwrap();
		let second = tracker.mark_paid(&deposit.id).await.unwrap();
		assert_eq!(first, second);
		assert_eq!(tracker.totals("o1").await.unwrap().amount_paid, 400_000);
	}

	#[tokio::test]
	async fn test_record_deposit_guards() {
		let tracker = tracker();
		assert!(matches!(
			tracker.record_deposit("o1", 1_000, 10).await,
			Err(PaymentError::PlanNotFound(_))
		));

		tracker.open_plan("o1", 500_000).await.unwrap();
		assert!(matches!(
			tracker.record_deposit("o1", 0, 10).await,
			Err(PaymentError::Validation(_))
		));
		assert!(matches!(
			tracker.record_deposit("o1", 1_000, 101).await,
			Err(PaymentError::Validation(_))
		));
		tracker.record_deposit("o1", 300_000, 60).await.unwrap();
		assert!(matches!(
			tracker.record_deposit("o1", 300_000, 60).await,
			Err(PaymentError::Validation(_))
		));
		assert!(matches!(
			tracker.mark_paid("missing").await,
			Err(PaymentError::DepositNotFound(_))
		));
	}

	#[tokio::test]
	async fn test_plan_total_is_locked_once_deposits_exist() {
		let tracker = tracker();
		tracker.open_plan("o1", 500_000).await.unwrap();
		tracker.open_plan("o1", 600_000).await.unwrap();
		tracker.record_deposit("o1", 100_000, 10).await.unwrap();
		assert!(matches!(
			tracker.open_plan("o1", 700_000).await,
			Err(PaymentError::Conflict(_))
		));
	}

	#[tokio::test]
	async fn test_paid_total_matches_paid_deposits_under_interleaving() {
		let tracker = tracker();
		tracker.open_plan("o1", 10_000_000).await.unwrap();
		let mut ids = Vec::new();
		for _ in 0..10 {
			ids.push(tracker.record_deposit("o1", 1_000_000, 10).await.unwrap().id);
		}

		let mut tasks = tokio::task::JoinSet::new();
		for id in ids.iter().step_by(2).chain(ids.iter().take(3)) {
			let tracker = tracker.clone();
			let id = id.clone();
			tasks.spawn(async move { tracker.mark_paid(&id).await });
		}
		while let Some(result) = tasks.join_next().await {
			result.unwrap().unwrap();
		}

		let deposits = tracker.deposits("o1").await.unwrap();
		let expected: u64 = deposits.iter().filter(|d| d.is_paid()).map(|d| d.amount).sum();
		let totals = tracker.totals("o1").await.unwrap();
		assert_eq!(totals.amount_paid, expected);
		assert_eq!(totals.amount_paid, 6_000_000);
		assert_eq!(totals.amount_remaining, 4_000_000);
	}
}
