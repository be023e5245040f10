//! Mock courier for tests and local development.
//!
//! Hands out sequential `MOCK000001`-style codes, counts calls and can be told
//! to fail with a fixed message.

use crate::{CourierError, CourierFactory, CourierInterface, CourierRegistry};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use woodcraft_types::{
	ConfigSchema, CourierReceipt, CourierRequest, Field, FieldType, ImplementationRegistry,
	Schema, ValidationError,
};

pub struct MockCourier {
	calls: AtomicUsize,
	failure: RwLock<Option<String>>,
	requests: RwLock<Vec<CourierRequest>>,
}

impl MockCourier {
	pub fn new() -> Self {
		Self {
			calls: AtomicUsize::new(0),
			failure: RwLock::new(None),
			requests: RwLock::new(Vec::new()),
		}
	}

	/// A courier that rejects every shipment with `message`.
	pub fn failing(message: impl Into<String>) -> Self {
		Self {
			failure: RwLock::new(Some(message.into())),
			..Self::new()
		}
	}

	/// Sets or clears the failure message.
	pub async fn set_failure(&self, message: Option<String>) {
		*self.failure.write().await = message;
	}

	/// Number of `create_order` calls, failed ones included.
	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	/// Requests that produced a shipment, oldest first.
	pub async fn requests(&self) -> Vec<CourierRequest> {
		self.requests.read().await.clone()
	}
}

impl Default for MockCourier {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl CourierInterface for MockCourier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MockCourierSchema)
	}

	async fn create_order(&self, request: &CourierRequest) -> Result<CourierReceipt, CourierError> {
		let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
		if let Some(message) = self.failure.read().await.clone() {
			return Err(CourierError::Rejected(message));
		}

		self.requests.write().await.push(request.clone());
		Ok(CourierReceipt {
			order_code: format!("MOCK{:06}", call),
			total_fee: 0,
			expected_delivery_time: None,
		})
	}
}

pub struct MockCourierSchema;

impl ConfigSchema for MockCourierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![Field::new("fail_with", FieldType::String)]).validate(config)
	}
}

/// Factory function to create a mock courier from configuration.
///
/// Configuration parameters:
/// - `fail_with`: message every shipment is rejected with (optional)
pub fn create_courier(config: &toml::Value) -> Result<Box<dyn CourierInterface>, CourierError> {
	MockCourierSchema
		.validate(config)
		.map_err(|e| CourierError::Configuration(e.to_string()))?;

	let courier = match config.get("fail_with").and_then(|v| v.as_str()) {
		Some(message) => MockCourier::failing(message),
		None => MockCourier::new(),
	};
	Ok(Box::new(courier))
}

/// Registry for the mock courier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = CourierFactory;

	fn factory() -> Self::Factory {
		create_courier
	}
}

impl CourierRegistry for Registry {}
