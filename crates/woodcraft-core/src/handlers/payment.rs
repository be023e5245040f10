//! Payment handler for deposits and the start of production.

use crate::engine::event_bus::EventBus;
use crate::engine::EngineError;
use crate::handlers::require_status;
use crate::state::OrderStateMachine;
use std::sync::Arc;
use tracing::{info, instrument};
use woodcraft_payment::DepositTracker;
use woodcraft_types::{
	truncate_id, Deposit, JournalStep, LifecycleEvent, Order, OrderStatus, PaymentEvent,
	TransitionJournal,
};

pub struct PaymentHandler {
	deposits: Arc<DepositTracker>,
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
}

impl PaymentHandler {
	pub fn new(
		deposits: Arc<DepositTracker>,
		state_machine: Arc<OrderStateMachine>,
		event_bus: EventBus,
	) -> Self {
		Self {
			deposits,
			state_machine,
			event_bus,
		}
	}

	/// Adds one unpaid installment to the order's deposit plan.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn record(
		&self,
		order: &Order,
		amount: u64,
		percent: u8,
	) -> Result<Deposit, EngineError> {
		require_status(
			order,
			&[
				OrderStatus::ContractSigned,
				OrderStatus::InProgress,
				OrderStatus::ShippedOut,
			],
		)?;

		let deposit = self.deposits.record_deposit(&order.id, amount, percent).await?;
		info!(
			deposit_number = deposit.deposit_number,
			amount, "Deposit recorded"
		);
		self.event_bus
			.publish(LifecycleEvent::Payment(PaymentEvent::DepositRecorded {
				order_id: order.id.clone(),
				deposit_id: deposit.id.clone(),
				amount: deposit.amount,
			}))
			.ok();
		Ok(deposit)
	}

	/// Marks a deposit paid and refreshes the order's balances.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn pay(&self, order: &Order, deposit_id: &str) -> Result<Deposit, EngineError> {
		require_status(
			order,
			&[
				OrderStatus::ContractSigned,
				OrderStatus::InProgress,
				OrderStatus::ShippedOut,
			],
		)?;

		let was_paid = self
			.deposits
			.deposits(&order.id)
			.await?
			.iter()
			.any(|d| d.id == deposit_id && d.is_paid());
		let deposit = self.deposits.mark_paid(deposit_id).await?;
		let totals = self.deposits.totals(&order.id).await?;
		self.state_machine
			.update_order_with(&order.id, |o| {
				o.amount_paid = totals.amount_paid;
				o.amount_remaining = totals.amount_remaining;
			})
			.await?;

		if !was_paid {
			self.event_bus
				.publish(LifecycleEvent::Payment(PaymentEvent::DepositPaid {
					order_id: order.id.clone(),
					deposit_id: deposit.id.clone(),
					amount: deposit.amount,
				}))
				.ok();
		}
		Ok(deposit)
	}

	/// Moves a signed order into production once a deposit is paid.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn start_production(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		let totals = self.deposits.totals(&order.id).await?;
		if totals.amount_paid == 0 {
			return Err(EngineError::PreconditionFailed(format!(
				"order {} has no paid deposit",
				order.id
			)));
		}

		let updated = self
			.state_machine
			.transition_order_status(&order.id, OrderStatus::InProgress)
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::InProgress,
		});
		info!(paid = totals.amount_paid, "Production started");
		Ok(updated)
	}
}
