//! Event types for lifecycle notifications.
//!
//! Events flow through the engine's event bus. Subscribers act as the
//! notification sink: they are fire-and-forget and nothing they do feeds back
//! into a transition.

use crate::{OrderKind, OrderStatus, ShipmentDirection, TransitionKind};
use serde::{Deserialize, Serialize};

/// Main event type encompassing all lifecycle events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum LifecycleEvent {
	/// Events about order status.
	Order(OrderEvent),
	/// Events about courier shipments.
	Shipment(ShipmentEvent),
	/// Events about deposits.
	Payment(PaymentEvent),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OrderEvent {
	/// A customer placed a new order.
	Created { order_id: String, kind: OrderKind },
	/// A transition committed.
	StatusChanged {
		order_id: String,
		from: OrderStatus,
		to: OrderStatus,
	},
	/// A transition was rejected; the order status is unchanged.
	TransitionFailed {
		order_id: String,
		transition: TransitionKind,
		error: String,
	},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ShipmentEvent {
	/// The courier accepted a shipment.
	Created {
		order_id: String,
		direction: ShipmentDirection,
		order_code: String,
	},
	/// Courier creation was skipped for an installed order.
	Skipped {
		order_id: String,
		direction: ShipmentDirection,
	},
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PaymentEvent {
	/// A deposit plan was opened when the contract was signed.
	PlanScheduled { order_id: String, total_amount: u64 },
	/// The woodworker added an installment to the plan.
	DepositRecorded {
		order_id: String,
		deposit_id: String,
		amount: u64,
	},
	/// A deposit was marked paid.
	DepositPaid {
		order_id: String,
		deposit_id: String,
		amount: u64,
	},
}
