//! Handlers for the steps of the order lifecycle.
//!
//! The engine authorizes the caller, claims the order and opens the
//! transition journal; handlers check preconditions, call the lifecycle
//! components and commit the new status.

pub mod contract;
pub mod fulfillment;
pub mod payment;
pub mod quotation;

pub use contract::ContractHandler;
pub use fulfillment::FulfillmentHandler;
pub use payment::PaymentHandler;
pub use quotation::{QuotationHandler, ScopedLines};

use crate::engine::EngineError;
use woodcraft_types::{Order, OrderStatus};

/// Fails unless the order is in one of `allowed`.
pub(crate) fn require_status(order: &Order, allowed: &[OrderStatus]) -> Result<(), EngineError> {
	if allowed.contains(&order.status) {
		return Ok(());
	}
	let expected: Vec<String> = allowed.iter().map(|s| s.to_string()).collect();
	Err(EngineError::PreconditionFailed(format!(
		"order {} is {}, expected {}",
		order.id,
		order.status,
		expected.join(" or ")
	)))
}
