//! Order types for the woodworking storefront.
//!
//! Service orders (personalized products) and guarantee orders (warranty or
//! repair claims) share one `Order` shape tagged by `OrderKind`. Kind-specific
//! behavior lives in the state machine guards, not in separate types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ProductSpec;

/// Discriminates the two order flavours.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum OrderKind {
	/// Order for a personalized or custom-built product, quoted per product.
	Service,
	/// Warranty or repair claim, quoted for the whole order.
	Guarantee,
}

impl fmt::Display for OrderKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			OrderKind::Service => write!(f, "service"),
			OrderKind::Guarantee => write!(f, "guarantee"),
		}
	}
}

/// A product the customer asked for.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequestedProduct {
	pub product_id: String,
	#[serde(default)]
	pub name: String,
	pub quantity: u32,
	#[serde(default)]
	pub category: Option<String>,
	/// Warranty duration in months offered for this product.
	#[serde(default)]
	pub warranty_duration: Option<u32>,
	/// Specification used to size the courier package.
	#[serde(default)]
	pub spec: ProductSpec,
}

/// Represents an order moving through the fulfillment lifecycle.
///
/// Orders are never deleted. They are mutated only through state machine
/// transitions and end in either `Completed` or `Cancelled`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
	/// Unique identifier for this order.
	pub id: String,
	/// Service or guarantee order.
	pub kind: OrderKind,
	/// Current status of the order.
	pub status: OrderStatus,
	/// Products requested by the customer, in request order.
	pub requested_products: Vec<RequestedProduct>,
	/// Woodworker delivers and installs; no courier shipments are created.
	pub install: bool,
	/// Customer who placed the order.
	pub customer_id: String,
	/// Woodworker the order is placed with.
	pub woodworker_id: String,
	/// Total locked from the signed contract.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub total_amount: Option<u64>,
	/// Sum of paid deposits.
	#[serde(default)]
	pub amount_paid: u64,
	/// Contract total minus paid deposits.
	#[serde(default)]
	pub amount_remaining: u64,
	/// Shipping fee added to the quotation total.
	#[serde(default)]
	pub ship_fee: u64,
	/// Reason given when the order was cancelled.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub cancel_reason: Option<String>,
	/// When the woodworker confirmed receipt of the defective item (guarantee orders).
	#[serde(skip_serializing_if = "Option::is_none")]
	pub defective_received_at: Option<u64>,
	/// Timestamp when this order was created.
	pub created_at: u64,
	/// Timestamp when this order was last updated.
	pub updated_at: u64,
}

impl Order {
	/// Looks up a requested product by id.
	pub fn product(&self, product_id: &str) -> Option<&RequestedProduct> {
		self.requested_products
			.iter()
			.find(|p| p.product_id == product_id)
	}

	pub fn is_terminal(&self) -> bool {
		self.status.is_terminal()
	}
}

/// Customer request that creates a new order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewOrder {
	pub kind: OrderKind,
	pub requested_products: Vec<RequestedProduct>,
	#[serde(default)]
	pub install: bool,
	pub woodworker_id: String,
	#[serde(default)]
	pub ship_fee: u64,
}

/// Status of an order in the fulfillment lifecycle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum OrderStatus {
	/// Customer submitted the request.
	Requested,
	/// Woodworker is entering quotation lines.
	Quoting,
	/// Quotation complete; contract may be drafted and signed.
	ContractPending,
	/// Both parties signed; total is locked.
	ContractSigned,
	/// At least one deposit paid; woodworker is building or repairing.
	InProgress,
	/// Handed to the courier or installed.
	ShippedOut,
	/// Customer confirmed receipt.
	Completed,
	/// Cancelled with a reason.
	Cancelled,
	/// Woodworker accepted a warranty claim at no cost.
	FreeGuaranteeAccepted,
}

impl OrderStatus {
	pub fn is_terminal(&self) -> bool {
		matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
	}
}

impl fmt::Display for OrderStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OrderStatus::Requested => "Requested",
			OrderStatus::Quoting => "Quoting",
			OrderStatus::ContractPending => "ContractPending",
			OrderStatus::ContractSigned => "ContractSigned",
			OrderStatus::InProgress => "InProgress",
			OrderStatus::ShippedOut => "ShippedOut",
			OrderStatus::Completed => "Completed",
			OrderStatus::Cancelled => "Cancelled",
			OrderStatus::FreeGuaranteeAccepted => "FreeGuaranteeAccepted",
		};
		write!(f, "{}", name)
	}
}
