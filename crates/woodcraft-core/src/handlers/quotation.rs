//! Quotation handler for editing and submitting quotation lines.

use crate::engine::EngineError;
use crate::handlers::require_status;
use crate::state::OrderStateMachine;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument};
use woodcraft_quotation::{order_scopes, QuotationLedger};
use woodcraft_types::{
	truncate_id, JournalStep, Order, OrderKind, OrderStatus, QuotationDetail, QuotationScope,
	TransitionJournal,
};

/// Lines and total of one quotation scope.
#[derive(Debug, Clone, Serialize)]
pub struct ScopedLines {
	pub scope: QuotationScope,
	pub lines: Vec<QuotationDetail>,
	pub total: u64,
}

pub struct QuotationHandler {
	ledger: Arc<QuotationLedger>,
	state_machine: Arc<OrderStateMachine>,
}

impl QuotationHandler {
	pub fn new(ledger: Arc<QuotationLedger>, state_machine: Arc<OrderStateMachine>) -> Self {
		Self {
			ledger,
			state_machine,
		}
	}

	/// Scope a line edit applies to.
	///
	/// Service orders are quoted per requested product, guarantee orders for
	/// the whole order.
	fn scope_for(order: &Order, product_id: Option<&str>) -> Result<QuotationScope, EngineError> {
		match (order.kind, product_id) {
			(OrderKind::Service, Some(product_id)) => {
				if order.product(product_id).is_none() {
					return Err(EngineError::Validation(vec![format!(
						"product {} is not part of order {}",
						product_id, order.id
					)]));
				}
				Ok(QuotationScope::product(&order.id, product_id))
			},
			(OrderKind::Service, None) => Err(EngineError::Validation(vec![
				"service orders are quoted per product; product_id is required".into(),
			])),
			(OrderKind::Guarantee, None) => Ok(QuotationScope::order(&order.id)),
			(OrderKind::Guarantee, Some(_)) => Err(EngineError::Validation(vec![
				"guarantee orders are quoted for the whole order".into(),
			])),
		}
	}

	pub async fn add_line(
		&self,
		order: &Order,
		product_id: Option<&str>,
		line: QuotationDetail,
	) -> Result<QuotationDetail, EngineError> {
		require_status(order, &[OrderStatus::Quoting])?;
		let scope = Self::scope_for(order, product_id)?;
		Ok(self.ledger.add_line(&scope, line).await?)
	}

	pub async fn remove_line(
		&self,
		order: &Order,
		product_id: Option<&str>,
		line_id: &str,
	) -> Result<(), EngineError> {
		require_status(order, &[OrderStatus::Quoting])?;
		let scope = Self::scope_for(order, product_id)?;
		Ok(self.ledger.remove_line(&scope, line_id).await?)
	}

	pub async fn set_lines(
		&self,
		order: &Order,
		product_id: Option<&str>,
		lines: Vec<QuotationDetail>,
	) -> Result<Vec<QuotationDetail>, EngineError> {
		require_status(order, &[OrderStatus::Quoting])?;
		let scope = Self::scope_for(order, product_id)?;
		Ok(self.ledger.set_lines(&scope, lines).await?)
	}

	/// Lines of every scope of the order.
	pub async fn lines(&self, order: &Order) -> Result<Vec<ScopedLines>, EngineError> {
		let mut scoped = Vec::new();
		for scope in order_scopes(order) {
			let lines = self.ledger.lines(&scope).await?;
			let total = lines.iter().map(|l| l.cost_amount).sum();
			scoped.push(ScopedLines {
				scope,
				lines,
				total,
			});
		}
		Ok(scoped)
	}

	pub async fn begin(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		let updated = self
			.state_machine
			.transition_order_status(&order.id, OrderStatus::Quoting)
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::Quoting,
		});
		Ok(updated)
	}

	/// Moves a fully quoted order to `ContractPending`.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn submit(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		if !self.ledger.is_order_quoted(order).await? {
			return Err(EngineError::PreconditionFailed(format!(
				"order {} is not fully quoted",
				order.id
			)));
		}

		let total = self.ledger.total_for_order(order).await?;

		let updated = self
			.state_machine
			.transition_order_status(&order.id, OrderStatus::ContractPending)
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::ContractPending,
		});
		info!(total, "Quotation submitted");
		Ok(updated)
	}
}
