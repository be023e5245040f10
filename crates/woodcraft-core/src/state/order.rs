//! Order state machine implementation.
//!
//! Orders move `Requested -> Quoting -> ContractPending -> ContractSigned ->
//! InProgress -> ShippedOut -> Completed`. Guarantee claims may skip pricing
//! through `Requested -> FreeGuaranteeAccepted -> ShippedOut`, and any
//! non-terminal order may be cancelled.

use once_cell::sync::Lazy;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;
use woodcraft_storage::{StorageError, StorageService};
use woodcraft_types::{current_timestamp, Order, OrderKind, OrderStatus, StorageKey};

/// Errors that can occur during order state management.
#[derive(Debug, Error)]
pub enum OrderStateError {
	#[error("Storage error: {0}")]
	Storage(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("{kind} orders cannot move to {to}")]
	KindMismatch { kind: OrderKind, to: OrderStatus },
	#[error("Order not found: {0}")]
	OrderNotFound(String),
}

/// Static transition table - each state maps to allowed next states
static TRANSITIONS: Lazy<HashMap<OrderStatus, HashSet<OrderStatus>>> = Lazy::new(|| {
	use OrderStatus::*;

	let mut m = HashMap::new();
	m.insert(
		Requested,
		HashSet::from([Quoting, FreeGuaranteeAccepted, Cancelled]),
	);
	m.insert(Quoting, HashSet::from([ContractPending, Cancelled]));
	m.insert(ContractPending, HashSet::from([ContractSigned, Cancelled]));
	m.insert(ContractSigned, HashSet::from([InProgress, Cancelled]));
	m.insert(InProgress, HashSet::from([ShippedOut, Cancelled]));
	m.insert(FreeGuaranteeAccepted, HashSet::from([ShippedOut, Cancelled]));
	m.insert(ShippedOut, HashSet::from([Completed, Cancelled]));
	m.insert(Completed, HashSet::new()); // terminal
	m.insert(Cancelled, HashSet::new()); // terminal
	m
});

/// Manages order state transitions and persistence
pub struct OrderStateMachine {
	storage: Arc<StorageService>,
}

impl OrderStateMachine {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Checks the transition table.
	pub fn is_valid_transition(from: OrderStatus, to: OrderStatus) -> bool {
		TRANSITIONS
			.get(&from)
			.is_some_and(|allowed| allowed.contains(&to))
	}

	/// Checks the transition table and the kind guard for `order`.
	pub fn check_transition(order: &Order, to: OrderStatus) -> Result<(), OrderStateError> {
		if to == OrderStatus::FreeGuaranteeAccepted && order.kind != OrderKind::Guarantee {
			return Err(OrderStateError::KindMismatch {
				kind: order.kind,
				to,
			});
		}
		if !Self::is_valid_transition(order.status, to) {
			return Err(OrderStateError::InvalidTransition {
				from: order.status,
				to,
			});
		}
		Ok(())
	}

	/// Gets an order by ID
	pub async fn get_order(&self, order_id: &str) -> Result<Order, OrderStateError> {
		self.storage
			.retrieve(StorageKey::Orders, order_id)
			.await
			.map_err(|e| match e {
				StorageError::NotFound => OrderStateError::OrderNotFound(order_id.to_string()),
				other => OrderStateError::Storage(other.to_string()),
			})
	}

	/// Stores a new order
	pub async fn store_order(&self, order: &Order) -> Result<(), OrderStateError> {
		self.storage
			.store(StorageKey::Orders, &order.id, order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))
	}

	/// Updates an order with a closure and persists it
	pub async fn update_order_with<F>(
		&self,
		order_id: &str,
		updater: F,
	) -> Result<Order, OrderStateError>
	where
		F: FnOnce(&mut Order),
	{
		let mut order = self.get_order(order_id).await?;

		updater(&mut order);
		order.updated_at = current_timestamp();

		self.storage
			.update(StorageKey::Orders, order_id, &order)
			.await
			.map_err(|e| OrderStateError::Storage(e.to_string()))?;

		Ok(order)
	}

	/// Transitions an order to a new status with validation
	pub async fn transition_order_status(
		&self,
		order_id: &str,
		new_status: OrderStatus,
	) -> Result<Order, OrderStateError> {
		self.transition_with(order_id, new_status, |_| {}).await
	}

	/// Transitions an order and applies `updater` in the same write.
	pub async fn transition_with<F>(
		&self,
		order_id: &str,
		new_status: OrderStatus,
		updater: F,
	) -> Result<Order, OrderStateError>
	where
		F: FnOnce(&mut Order),
	{
		let order = self.get_order(order_id).await?;
		Self::check_transition(&order, new_status)?;

		self.update_order_with(order_id, |o| {
			updater(o);
			o.status = new_status;
		})
		.await
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_storage::implementations::memory::MemoryStorage;

	fn order(kind: OrderKind, status: OrderStatus) -> Order {
		Order {
			id: "order-1".into(),
			kind,
			status,
			requested_products: vec![],
			install: false,
			customer_id: "c1".into(),
			woodworker_id: "w1".into(),
			total_amount: None,
			amount_paid: 0,
			amount_remaining: 0,
			ship_fee: 0,
			cancel_reason: None,
			defective_received_at: None,
			created_at: 0,
			updated_at: 0,
		}
	}

	#[test]
	fn test_main_path_is_valid() {
		use OrderStatus::*;
		let path = [
			Requested,
			Quoting,
			ContractPending,
			ContractSigned,
			InProgress,
			ShippedOut,
			Completed,
		];
		for pair in path.windows(2) {
			assert!(OrderStateMachine::is_valid_transition(pair[0], pair[1]));
		}
		assert!(!OrderStateMachine::is_valid_transition(Requested, ContractSigned));
		assert!(!OrderStateMachine::is_valid_transition(ShippedOut, InProgress));
	}

	#[test]
	fn test_terminal_states_have_no_exit() {
		use OrderStatus::*;
		for to in [Requested, Quoting, Cancelled, Completed] {
			assert!(!OrderStateMachine::is_valid_transition(Completed, to));
			assert!(!OrderStateMachine::is_valid_transition(Cancelled, to));
		}
	}

	#[test]
	fn test_free_guarantee_only_for_guarantee_orders() {
		let service = order(OrderKind::Service, OrderStatus::Requested);
		assert!(matches!(
			OrderStateMachine::check_transition(&service, OrderStatus::FreeGuaranteeAccepted),
			Err(OrderStateError::KindMismatch { .. })
		));

		let guarantee = order(OrderKind::Guarantee, OrderStatus::Requested);
		assert!(
			OrderStateMachine::check_transition(&guarantee, OrderStatus::FreeGuaranteeAccepted)
				.is_ok()
		);
	}

	#[tokio::test]
	async fn test_transition_persists_status() {
		let machine =
			OrderStateMachine::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))));
		machine
			.store_order(&order(OrderKind::Service, OrderStatus::Requested))
			.await
			.unwrap();

		let updated = machine
			.transition_order_status("order-1", OrderStatus::Quoting)
			.await
			.unwrap();
		assert_eq!(updated.status, OrderStatus::Quoting);

		let result = machine
			.transition_order_status("order-1", OrderStatus::Completed)
			.await;
		assert!(matches!(
			result,
			Err(OrderStateError::InvalidTransition {
				from: OrderStatus::Quoting,
				to: OrderStatus::Completed
			})
		));
		assert!(matches!(
			machine.get_order("missing").await,
			Err(OrderStateError::OrderNotFound(_))
		));
	}
}
