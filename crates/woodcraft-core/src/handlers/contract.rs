//! Contract handler for drafting and signing.
//!
//! The customer's signature closes the contract: it locks the order total to
//! the contract total and schedules the deposit plan.

use crate::engine::event_bus::EventBus;
use crate::engine::EngineError;
use crate::handlers::require_status;
use crate::state::OrderStateMachine;
use std::sync::Arc;
use tracing::{info, instrument};
use woodcraft_contract::ContractManager;
use woodcraft_payment::DepositTracker;
use woodcraft_types::{
	format_vnd, truncate_id, Contract, ContractDraft, JournalStep, LifecycleEvent, Order,
	OrderStatus, PaymentEvent, RequestContext, SignatureAsset, TransitionJournal,
};

pub struct ContractHandler {
	contracts: Arc<ContractManager>,
	deposits: Arc<DepositTracker>,
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
}

impl ContractHandler {
	pub fn new(
		contracts: Arc<ContractManager>,
		deposits: Arc<DepositTracker>,
		state_machine: Arc<OrderStateMachine>,
		event_bus: EventBus,
	) -> Self {
		Self {
			contracts,
			deposits,
			state_machine,
			event_bus,
		}
	}

	async fn active_contract(&self, order: &Order) -> Result<Contract, EngineError> {
		self.contracts.get(&order.id).await?.ok_or_else(|| {
			EngineError::PreconditionFailed(format!("order {} has no contract", order.id))
		})
	}

	/// Drafts the contract; a `Quoting` order moves to `ContractPending`.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn draft(
		&self,
		order: &Order,
		draft: ContractDraft,
		context: &RequestContext,
		journal: &mut TransitionJournal,
	) -> Result<Contract, EngineError> {
		require_status(order, &[OrderStatus::Quoting, OrderStatus::ContractPending])?;

		let contract = self.contracts.draft(order, draft, context).await?;
		journal.record(JournalStep::ContractDrafted {
			contract_id: contract.id.clone(),
		});

		if order.status == OrderStatus::Quoting {
			self.state_machine
				.transition_order_status(&order.id, OrderStatus::ContractPending)
				.await?;
			journal.record(JournalStep::StatusCommitted {
				status: OrderStatus::ContractPending,
			});
		}
		Ok(contract)
	}

	pub async fn sign_as_woodworker(
		&self,
		order: &Order,
		asset: &SignatureAsset,
		context: &RequestContext,
	) -> Result<Contract, EngineError> {
		require_status(order, &[OrderStatus::ContractPending])?;
		let contract = self.active_contract(order).await?;
		Ok(self
			.contracts
			.attach_woodworker_signature(&contract.id, asset, context)
			.await?)
	}

	/// Attaches the customer's signature, schedules deposits and moves the
	/// order to `ContractSigned` with its total locked.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn sign_as_customer(
		&self,
		order: &Order,
		asset: &SignatureAsset,
		context: &RequestContext,
		journal: &mut TransitionJournal,
	) -> Result<Contract, EngineError> {
		require_status(order, &[OrderStatus::ContractPending])?;
		let contract = self.active_contract(order).await?;

		let contract = self
			.contracts
			.attach_customer_signature(&contract.id, asset, context)
			.await?;
		journal.record(JournalStep::SignatureAttached {
			contract_id: contract.id.clone(),
		});

		let total = contract.contract_total_amount;
		self.deposits.schedule(&order.id, total, None).await?;
		journal.record(JournalStep::DepositPlanScheduled {
			total_amount: total,
		});
		let totals = self.deposits.totals(&order.id).await?;

		self.state_machine
			.transition_with(&order.id, OrderStatus::ContractSigned, |o| {
				o.total_amount = Some(total);
				o.amount_paid = totals.amount_paid;
				o.amount_remaining = totals.amount_remaining;
			})
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::ContractSigned,
		});

		self.event_bus
			.publish(LifecycleEvent::Payment(PaymentEvent::PlanScheduled {
				order_id: order.id.clone(),
				total_amount: total,
			}))
			.ok();
		info!(total = %format_vnd(total), "Contract signed, total locked");
		Ok(contract)
	}
}
