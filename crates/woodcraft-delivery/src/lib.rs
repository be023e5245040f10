//! Shipment coordination for the woodcraft orchestrator.
//!
//! This crate keeps the shipment records of an order (at most one per
//! direction) and creates courier shipments for them through the courier
//! seam. Orders delivered and installed by the woodworker never reach the
//! courier.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};
use woodcraft_storage::{StorageError, StorageService};
use woodcraft_types::{
	current_timestamp, truncate_id, ConfigSchema, CourierReceipt, CourierRequest,
	ImplementationRegistry, Order, RequestedProduct, Shipment, ShipmentDirection, ShipmentDraft,
	ShipmentOutcome, StorageKey,
};

mod package;

pub use package::{courier_item, extract_dimensions, package_of, PackageSettings};

/// Re-export implementations
pub mod implementations {
	pub mod ghn;
	pub mod mock;
}

/// Errors raised by courier backends.
#[derive(Debug, Error)]
pub enum CourierError {
	/// The courier answered with an error; the message is passed on verbatim.
	#[error("{0}")]
	Rejected(String),
	/// The courier could not be reached.
	#[error("{0}")]
	Network(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Errors that can occur during shipment operations.
#[derive(Debug, Error)]
pub enum ShipmentError {
	/// No shipment record exists for the direction.
	#[error("No {direction} shipment registered for order {order_id}")]
	MissingShipment {
		order_id: String,
		direction: ShipmentDirection,
	},
	/// The shipment already has a courier order and cannot be edited.
	#[error("{direction} shipment of order {order_id} was already created with the courier")]
	AlreadyCreated {
		order_id: String,
		direction: ShipmentDirection,
	},
	/// A different courier code is already recorded.
	#[error("Shipment already has order code {existing}, refusing {requested}")]
	CodeConflict { existing: String, requested: String },
	/// The courier refused or failed the shipment.
	#[error("{0}")]
	CreationFailed(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for ShipmentError {
	fn from(err: StorageError) -> Self {
		ShipmentError::Storage(err.to_string())
	}
}

/// Trait implemented by courier backends.
#[async_trait]
pub trait CourierInterface: Send + Sync {
	/// Returns the configuration schema for this courier.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Creates a courier shipment and returns its tracking code.
	async fn create_order(&self, request: &CourierRequest) -> Result<CourierReceipt, CourierError>;
}

/// Type alias for courier factory functions.
pub type CourierFactory = fn(&toml::Value) -> Result<Box<dyn CourierInterface>, CourierError>;

/// Registry trait for courier implementations.
pub trait CourierRegistry: ImplementationRegistry<Factory = CourierFactory> {}

/// Get all registered courier implementations.
pub fn get_all_implementations() -> Vec<(&'static str, CourierFactory)> {
	use implementations::{ghn, mock};

	vec![
		(ghn::Registry::NAME, ghn::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Keeps shipment records and creates courier shipments for them.
pub struct ShipmentCoordinator {
	storage: Arc<StorageService>,
	courier: Arc<dyn CourierInterface>,
	settings: PackageSettings,
}

impl ShipmentCoordinator {
	pub fn new(
		storage: Arc<StorageService>,
		courier: Arc<dyn CourierInterface>,
		settings: PackageSettings,
	) -> Self {
		Self {
			storage,
			courier,
			settings,
		}
	}

	/// Records where a shipment goes. Replaces a pending record of the same
	/// direction; a record already sent to the courier is final.
	pub async fn register_shipment(
		&self,
		order_id: &str,
		direction: ShipmentDirection,
		draft: ShipmentDraft,
	) -> Result<Shipment, ShipmentError> {
		let mut shipments = self.shipments(order_id).await?;
		let now = current_timestamp();

		let shipment = match shipments.iter_mut().find(|s| s.direction == direction) {
			Some(existing) if existing.is_created() => {
				return Err(ShipmentError::AlreadyCreated {
					order_id: order_id.to_string(),
					direction,
				})
			},
			Some(existing) => {
				existing.from = draft.from;
				existing.to = draft.to;
				existing.to_ward_code = draft.to_ward_code;
				existing.to_district_id = draft.to_district_id;
				existing.updated_at = now;
				existing.clone()
			},
			None => {
				let shipment = Shipment {
					order_id: order_id.to_string(),
					direction,
					from: draft.from,
					to: draft.to,
					to_ward_code: draft.to_ward_code,
					to_district_id: draft.to_district_id,
					order_code: None,
					created_at: now,
					updated_at: now,
				};
				shipments.push(shipment.clone());
				shipment
			},
		};

		self.storage
			.store(StorageKey::Shipments, order_id, &shipments)
			.await?;
		Ok(shipment)
	}

	/// Shipment records of an order.
	pub async fn shipments(&self, order_id: &str) -> Result<Vec<Shipment>, ShipmentError> {
		Ok(self
			.storage
			.retrieve_optional::<Vec<Shipment>>(StorageKey::Shipments, order_id)
			.await?
			.unwrap_or_default())
	}

	pub async fn shipment(
		&self,
		order_id: &str,
		direction: ShipmentDirection,
	) -> Result<Option<Shipment>, ShipmentError> {
		Ok(self
			.shipments(order_id)
			.await?
			.into_iter()
			.find(|s| s.direction == direction))
	}

	/// Creates the courier shipment of one direction.
	///
	/// Installed orders are skipped without contacting the courier. A record
	/// that already carries a code is returned as created. `product` narrows
	/// the package to one requested product; otherwise every product ships.
	/// The returned code is not stored; see [`Self::record_order_code`].
	pub async fn create_shipment(
		&self,
		order: &Order,
		product: Option<&RequestedProduct>,
		direction: ShipmentDirection,
	) -> Result<ShipmentOutcome, ShipmentError> {
		if order.install {
			info!(
				order_id = %truncate_id(&order.id),
				direction = %direction,
				"Install order, courier shipment skipped"
			);
			return Ok(ShipmentOutcome::Skipped);
		}

		let record = self.shipment(&order.id, direction).await?.ok_or_else(|| {
			ShipmentError::MissingShipment {
				order_id: order.id.clone(),
				direction,
			}
		})?;
		if let Some(order_code) = record.order_code {
			return Ok(ShipmentOutcome::Created { order_code });
		}

		let request = self.build_request(order, product, &record);
		let receipt = self.courier.create_order(&request).await.map_err(|e| {
			warn!(
				order_id = %truncate_id(&order.id),
				direction = %direction,
				error = %e,
				"Courier shipment creation failed"
			);
			ShipmentError::CreationFailed(e.to_string())
		})?;

		info!(
			order_id = %truncate_id(&order.id),
			direction = %direction,
			order_code = %receipt.order_code,
			fee = receipt.total_fee,
			"Courier shipment created"
		);
		Ok(ShipmentOutcome::Created {
			order_code: receipt.order_code,
		})
	}

	/// Stores the courier code on a shipment record.
	///
	/// Recording the same code again is a no-op; a different code is refused.
	pub async fn record_order_code(
		&self,
		order_id: &str,
		order_code: &str,
		direction: ShipmentDirection,
	) -> Result<Shipment, ShipmentError> {
		let mut shipments = self.shipments(order_id).await?;
		let shipment = shipments
			.iter_mut()
			.find(|s| s.direction == direction)
			.ok_or_else(|| ShipmentError::MissingShipment {
				order_id: order_id.to_string(),
				direction,
			})?;

		match shipment.order_code.as_deref() {
			Some(existing) if existing == order_code => return Ok(shipment.clone()),
			Some(existing) => {
				return Err(ShipmentError::CodeConflict {
					existing: existing.to_string(),
					requested: order_code.to_string(),
				})
			},
			None => {},
		}

		shipment.order_code = Some(order_code.to_string());
		shipment.updated_at = current_timestamp();
		let recorded = shipment.clone();
		self.storage
			.store(StorageKey::Shipments, order_id, &shipments)
			.await?;
		Ok(recorded)
	}

	fn build_request(
		&self,
		order: &Order,
		product: Option<&RequestedProduct>,
		record: &Shipment,
	) -> CourierRequest {
		let items: Vec<_> = match product {
			Some(product) => vec![courier_item(product, &self.settings)],
			None => order
				.requested_products
				.iter()
				.map(|p| courier_item(p, &self.settings))
				.collect(),
		};
		let (dimensions, weight) = package_of(&items, &self.settings);

		CourierRequest {
			client_order_code: format!("{}-{}", order.id, record.direction.code()),
			from: record.from.clone(),
			to: record.to.clone(),
			to_ward_code: record.to_ward_code.clone(),
			to_district_id: record.to_district_id,
			weight,
			length: dimensions.length,
			width: dimensions.width,
			height: dimensions.height,
			service_type_id: self.settings.service_type_id,
			payment_type_id: self.settings.payment_type_id,
			required_note: self.settings.required_note.clone(),
			items,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use implementations::mock::MockCourier;
	use woodcraft_storage::implementations::memory::MemoryStorage;
	use woodcraft_types::{OrderKind, OrderStatus, ProductSpec, ShipmentContact};

	fn coordinator(courier: Arc<MockCourier>) -> ShipmentCoordinator {
		ShipmentCoordinator::new(
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			courier,
			PackageSettings::default(),
		)
	}

	fn order(install: bool) -> Order {
		Order {
			id: "order-1".into(),
			kind: OrderKind::Service,
			status: OrderStatus::InProgress,
			requested_products: vec![RequestedProduct {
				product_id: "p1".into(),
				name: "Tủ gỗ".into(),
				quantity: 1,
				category: None,
				warranty_duration: Some(12),
				spec: ProductSpec {
					variant_dimensions: Some("80 x 40 x 180".into()),
					technical_specs: vec![],
					weight_grams: Some(25_000),
				},
			}],
			install,
			customer_id: "c1".into(),
			woodworker_id: "w1".into(),
			total_amount: Some(700_000),
			amount_paid: 0,
			amount_remaining: 700_000,
			ship_fee: 0,
			cancel_reason: None,
			defective_received_at: None,
			created_at: 0,
			updated_at: 0,
		}
	}

	fn draft() -> ShipmentDraft {
		ShipmentDraft {
			from: ShipmentContact {
				name: "Xưởng mộc An".into(),
				phone: "0900000001".into(),
				address: "12 Lê Lợi".into(),
			},
			to: ShipmentContact {
				name: "Chị Hoa".into(),
				phone: "0900000002".into(),
				address: "34 Trần Phú".into(),
			},
			to_ward_code: "20308".into(),
			to_district_id: 1444,
		}
	}

	#[tokio::test]
	async fn test_install_order_skips_courier() {
		let courier = Arc::new(MockCourier::new());
		let coordinator = coordinator(courier.clone());

		let outcome = coordinator
			.create_shipment(&order(true), None, ShipmentDirection::Outbound)
			.await
			.unwrap();
		assert_eq!(outcome, ShipmentOutcome::Skipped);
		assert_eq!(courier.call_count(), 0);
	}

	#[tokio::test]
	async fn test_missing_shipment_record() {
		let courier = Arc::new(MockCourier::new());
		let coordinator = coordinator(courier.clone());

		let result = coordinator
			.create_shipment(&order(false), None, ShipmentDirection::Outbound)
			.await;
		assert!(matches!(result, Err(ShipmentError::MissingShipment { .. })));
		assert_eq!(courier.call_count(), 0);
	}

	#[tokio::test]
	async fn test_create_and_record_order_code() {
		let courier = Arc::new(MockCourier::new());
		let coordinator = coordinator(courier.clone());
		let order = order(false);
		coordinator
			.register_shipment(&order.id, ShipmentDirection::Outbound, draft())
			.await
			.unwrap();

		let ShipmentOutcome::Created { order_code } = coordinator
			.create_shipment(&order, None, ShipmentDirection::Outbound)
			.await
			.unwrap()
		else {
			panic!("expected a courier shipment");
		};

		let request = courier.requests().await.pop().unwrap();
		assert_eq!(request.client_order_code, "order-1-out");
		assert_eq!((request.length, request.width, request.height), (80, 40, 180));
		assert_eq!(request.weight, 25_000);
		assert_eq!(request.to_district_id, 1444);

		coordinator
			.record_order_code(&order.id, &order_code, ShipmentDirection::Outbound)
			.await
			.unwrap();
		// Same code again is fine, a different one is not
		coordinator
			.record_order_code(&order.id, &order_code, ShipmentDirection::Outbound)
			.await
			.unwrap();
		assert!(matches!(
			coordinator
				.record_order_code(&order.id, "OTHER", ShipmentDirection::Outbound)
				.await,
			Err(ShipmentError::CodeConflict { .. })
		));

		// A created shipment is not sent to the courier twice
		coordinator
			.create_shipment(&order, None, ShipmentDirection::Outbound)
			.await
			.unwrap();
		assert_eq!(courier.call_count(), 1);
		assert!(matches!(
			coordinator
				.register_shipment(&order.id, ShipmentDirection::Outbound, draft())
				.await,
			Err(ShipmentError::AlreadyCreated { .. })
		));
	}

	#[tokio::test]
	async fn test_courier_failure_message_is_kept() {
		let courier = Arc::new(MockCourier::failing("Số điện thoại không hợp lệ"));
		let coordinator = coordinator(courier.clone());
		let order = order(false);
		coordinator
			.register_shipment(&order.id, ShipmentDirection::Outbound, draft())
			.await
			.unwrap();

		let result = coordinator
			.create_shipment(&order, None, ShipmentDirection::Outbound)
			.await;
		assert!(
			matches!(result, Err(ShipmentError::CreationFailed(ref m)) if m == "Số điện thoại không hợp lệ")
		);
		let record = coordinator
			.shipment(&order.id, ShipmentDirection::Outbound)
			.await
			.unwrap()
			.unwrap();
		assert!(record.order_code.is_none());
	}
}
