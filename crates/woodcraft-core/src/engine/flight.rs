//! Per-order single-flight guard.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use super::EngineError;

/// Orders with an operation in progress.
#[derive(Default, Clone)]
pub(crate) struct InFlight {
	orders: Arc<Mutex<HashSet<String>>>,
}

impl InFlight {
	/// Claims an order until the returned guard drops.
	pub(crate) fn acquire(&self, order_id: &str) -> Result<FlightGuard, EngineError> {
		let mut orders = self.orders.lock().unwrap_or_else(PoisonError::into_inner);
		if !orders.insert(order_id.to_string()) {
			return Err(EngineError::Conflict(format!(
				"another operation on order {} is in progress",
				order_id
			)));
		}
		Ok(FlightGuard {
			orders: self.orders.clone(),
			order_id: order_id.to_string(),
		})
	}
}

pub(crate) struct FlightGuard {
	orders: Arc<Mutex<HashSet<String>>>,
	order_id: String,
}

impl Drop for FlightGuard {
	fn drop(&mut self) {
		self.orders
			.lock()
			.unwrap_or_else(PoisonError::into_inner)
			.remove(&self.order_id);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_second_claim_conflicts_until_release() {
		let flights = InFlight::default();
		let guard = flights.acquire("o1").unwrap();
		assert!(matches!(flights.acquire("o1"), Err(EngineError::Conflict(_))));
		assert!(flights.acquire("o2").is_ok());

		drop(guard);
		assert!(flights.acquire("o1").is_ok());
	}
}
