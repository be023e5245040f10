//! Shipment and courier types.
//!
//! An order owns at most one shipment per direction: the outbound delivery
//! to the customer ("Giao") and, for guarantee claims, the inbound pickup of
//! the defective item ("Nhận"). A shipment without an `order_code` has not
//! been created with the courier yet.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of a shipment relative to the customer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ShipmentDirection {
	/// Delivery from the woodworker to the customer.
	#[serde(rename = "Giao")]
	Outbound,
	/// Pickup of a defective item from the customer.
	#[serde(rename = "Nhận")]
	Inbound,
}

impl ShipmentDirection {
	/// Wire name used by the backend.
	pub fn as_str(&self) -> &'static str {
		match self {
			ShipmentDirection::Outbound => "Giao",
			ShipmentDirection::Inbound => "Nhận",
		}
	}

	/// ASCII suffix for identifiers built from the direction.
	pub fn code(&self) -> &'static str {
		match self {
			ShipmentDirection::Outbound => "out",
			ShipmentDirection::Inbound => "in",
		}
	}
}

impl fmt::Display for ShipmentDirection {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Sender or receiver of a parcel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ShipmentContact {
	pub name: String,
	pub phone: String,
	pub address: String,
}

/// Addresses registered for a shipment before it is created with the courier.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShipmentDraft {
	pub from: ShipmentContact,
	pub to: ShipmentContact,
	pub to_ward_code: String,
	pub to_district_id: u32,
}

/// Shipment record tied to an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Shipment {
	pub order_id: String,
	pub direction: ShipmentDirection,
	pub from: ShipmentContact,
	pub to: ShipmentContact,
	pub to_ward_code: String,
	pub to_district_id: u32,
	/// Courier order code; `None` while pending creation.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub order_code: Option<String>,
	pub created_at: u64,
	pub updated_at: u64,
}

impl Shipment {
	pub fn is_created(&self) -> bool {
		self.order_code.is_some()
	}
}

/// Named technical specification value, e.g. `"Chiều dài" = "120"`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TechnicalSpec {
	pub name: String,
	pub value: String,
}

/// Product data the package dimensions are derived from.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ProductSpec {
	/// Variant configuration value in `"L x W x H"` form, centimetres.
	#[serde(default)]
	pub variant_dimensions: Option<String>,
	#[serde(default)]
	pub technical_specs: Vec<TechnicalSpec>,
	#[serde(default)]
	pub weight_grams: Option<u32>,
}

/// Package size in whole centimetres.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Dimensions {
	pub length: u32,
	pub width: u32,
	pub height: u32,
}

/// One item in a courier parcel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourierItem {
	pub name: String,
	pub code: String,
	pub quantity: u32,
	pub length: u32,
	pub width: u32,
	pub height: u32,
	pub weight: u32,
}

/// Request sent to the courier to create a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourierRequest {
	/// Idempotency reference on the courier side.
	pub client_order_code: String,
	pub from: ShipmentContact,
	pub to: ShipmentContact,
	pub to_ward_code: String,
	pub to_district_id: u32,
	pub weight: u32,
	pub length: u32,
	pub width: u32,
	pub height: u32,
	pub service_type_id: u32,
	pub payment_type_id: u32,
	pub required_note: String,
	pub items: Vec<CourierItem>,
}

/// What the courier returns for a created shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CourierReceipt {
	pub order_code: String,
	#[serde(default)]
	pub total_fee: u64,
	#[serde(default)]
	pub expected_delivery_time: Option<String>,
}

/// Result of asking the coordinator to create a shipment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum ShipmentOutcome {
	/// The courier created the shipment.
	Created { order_code: String },
	/// Installed orders never go through the courier.
	Skipped,
}
