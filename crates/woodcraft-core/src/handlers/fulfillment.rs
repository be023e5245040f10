//! Fulfillment handler for shipments, free guarantees, delivery, receipt and
//! cancellation.
//!
//! A courier shipment is journaled as soon as the courier returns its code,
//! before the code is stored on the shipment record. If storing the code or
//! committing the status fails afterwards, recovery finishes the transition
//! from the journal without calling the courier again.

use crate::engine::event_bus::EventBus;
use crate::engine::EngineError;
use crate::handlers::require_status;
use crate::journal::JournalStore;
use crate::state::OrderStateMachine;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use woodcraft_delivery::ShipmentCoordinator;
use woodcraft_types::{
	current_timestamp, truncate_id, JournalStep, LifecycleEvent, Order, OrderKind, OrderStatus,
	Shipment, ShipmentDirection, ShipmentDraft, ShipmentEvent, ShipmentOutcome,
	TransitionJournal,
};

/// Shipment records a courier-shipped guarantee order needs: pickup and delivery.
const GUARANTEE_SHIPMENTS: usize = 2;

pub struct FulfillmentHandler {
	shipments: Arc<ShipmentCoordinator>,
	journals: Arc<JournalStore>,
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
}

impl FulfillmentHandler {
	pub fn new(
		shipments: Arc<ShipmentCoordinator>,
		journals: Arc<JournalStore>,
		state_machine: Arc<OrderStateMachine>,
		event_bus: EventBus,
	) -> Self {
		Self {
			shipments,
			journals,
			state_machine,
			event_bus,
		}
	}

	pub async fn register_shipment(
		&self,
		order: &Order,
		direction: ShipmentDirection,
		draft: ShipmentDraft,
	) -> Result<Shipment, EngineError> {
		if order.is_terminal() {
			return Err(EngineError::PreconditionFailed(format!(
				"order {} is {}",
				order.id, order.status
			)));
		}
		if direction == ShipmentDirection::Inbound && order.kind != OrderKind::Guarantee {
			return Err(EngineError::Validation(vec![
				"only guarantee orders have an inbound pickup".into(),
			]));
		}
		Ok(self
			.shipments
			.register_shipment(&order.id, direction, draft)
			.await?)
	}

	pub async fn shipments(&self, order_id: &str) -> Result<Vec<Shipment>, EngineError> {
		Ok(self.shipments.shipments(order_id).await?)
	}

	/// Creates the courier shipment of `direction` and stores its code.
	async fn ship(
		&self,
		order: &Order,
		direction: ShipmentDirection,
		journal: &mut TransitionJournal,
	) -> Result<(), EngineError> {
		let product = match order.kind {
			OrderKind::Guarantee => order.requested_products.first(),
			OrderKind::Service => None,
		};

		match self
			.shipments
			.create_shipment(order, product, direction)
			.await?
		{
			ShipmentOutcome::Skipped => {
				journal.record(JournalStep::CourierSkipped { direction });
				self.event_bus
					.publish(LifecycleEvent::Shipment(ShipmentEvent::Skipped {
						order_id: order.id.clone(),
						direction,
					}))
					.ok();
			},
			ShipmentOutcome::Created { order_code } => {
				journal.record(JournalStep::CourierShipmentCreated {
					direction,
					order_code: order_code.clone(),
				});
				if let Err(e) = self.journals.save(journal).await {
					warn!(error = %e, "Failed to save journal after courier shipment");
				}

				self.shipments
					.record_order_code(&order.id, &order_code, direction)
					.await?;
				journal.record(JournalStep::OrderCodeRecorded {
					direction,
					order_code: order_code.clone(),
				});
				self.event_bus
					.publish(LifecycleEvent::Shipment(ShipmentEvent::Created {
						order_id: order.id.clone(),
						direction,
						order_code,
					}))
					.ok();
			},
		}
		Ok(())
	}

	/// Accepts a warranty claim at no cost and books the pickup of the
	/// defective item.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn accept_free_guarantee(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		OrderStateMachine::check_transition(order, OrderStatus::FreeGuaranteeAccepted)?;

		self.ship(order, ShipmentDirection::Inbound, journal).await?;

		let updated = self
			.state_machine
			.transition_with(&order.id, OrderStatus::FreeGuaranteeAccepted, |o| {
				o.total_amount = Some(0);
				o.amount_remaining = 0;
			})
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::FreeGuaranteeAccepted,
		});
		info!("Free guarantee accepted");
		Ok(updated)
	}

	pub async fn confirm_defective_received(&self, order: &Order) -> Result<Order, EngineError> {
		if order.kind != OrderKind::Guarantee {
			return Err(EngineError::PreconditionFailed(format!(
				"order {} is not a guarantee order",
				order.id
			)));
		}
		require_status(
			order,
			&[OrderStatus::FreeGuaranteeAccepted, OrderStatus::InProgress],
		)?;
		if order.defective_received_at.is_some() {
			return Ok(order.clone());
		}

		Ok(self
			.state_machine
			.update_order_with(&order.id, |o| {
				o.defective_received_at = Some(current_timestamp());
			})
			.await?)
	}

	/// Hands the finished order to the courier, or marks an installed order
	/// shipped.
	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn finish_and_ship(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		require_status(
			order,
			&[OrderStatus::InProgress, OrderStatus::FreeGuaranteeAccepted],
		)?;
		OrderStateMachine::check_transition(order, OrderStatus::ShippedOut)?;

		if order.kind == OrderKind::Guarantee && !order.install {
			let registered = self.shipments.shipments(&order.id).await?.len();
			if registered < GUARANTEE_SHIPMENTS {
				return Err(EngineError::ShipmentCreationFailed(format!(
					"guarantee order {} needs pickup and delivery shipments, {} registered",
					order.id, registered
				)));
			}
		}

		self.ship(order, ShipmentDirection::Outbound, journal).await?;

		let updated = self
			.state_machine
			.transition_order_status(&order.id, OrderStatus::ShippedOut)
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::ShippedOut,
		});
		info!(install = order.install, "Order shipped out");
		Ok(updated)
	}

	pub async fn confirm_receipt(
		&self,
		order: &Order,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		let updated = self
			.state_machine
			.transition_order_status(&order.id, OrderStatus::Completed)
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::Completed,
		});
		Ok(updated)
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(&order.id)))]
	pub async fn cancel(
		&self,
		order: &Order,
		reason: &str,
		journal: &mut TransitionJournal,
	) -> Result<Order, EngineError> {
		let reason = reason.trim();
		if reason.is_empty() {
			return Err(EngineError::Validation(vec![
				"cancellation reason is required".into(),
			]));
		}

		let updated = self
			.state_machine
			.transition_with(&order.id, OrderStatus::Cancelled, |o| {
				o.cancel_reason = Some(reason.to_string());
			})
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: OrderStatus::Cancelled,
		});
		info!(reason, "Order cancelled");
		Ok(updated)
	}
}
