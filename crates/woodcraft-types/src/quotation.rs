//! Quotation line types.
//!
//! A quotation line is one itemized cost (material, labor, paint...) that
//! contributes to an order's price. Service orders are quoted per requested
//! product, guarantee orders for the whole order.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Cost amounts must be a multiple of this step.
pub const COST_STEP: u64 = 1_000;
/// Smallest accepted cost amount.
pub const COST_MIN: u64 = 1_000;
/// Largest accepted cost amount.
pub const COST_CEILING: u64 = 50_000_000;

/// One itemized cost line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QuotationDetail {
	/// Line identifier. Assigned by the ledger when left empty.
	#[serde(default)]
	pub id: String,
	pub cost_type: String,
	pub quantity_required: String,
	pub cost_amount: u64,
}

impl QuotationDetail {
	pub fn new(
		cost_type: impl Into<String>,
		quantity_required: impl Into<String>,
		cost_amount: u64,
	) -> Self {
		Self {
			id: String::new(),
			cost_type: cost_type.into(),
			quantity_required: quantity_required.into(),
			cost_amount,
		}
	}
}

/// What a set of quotation lines prices.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum QuotationScope {
	/// The whole order (guarantee claims).
	Order { order_id: String },
	/// A single requested product (service orders).
	Product {
		order_id: String,
		product_id: String,
	},
}

impl QuotationScope {
	pub fn order(order_id: impl Into<String>) -> Self {
		Self::Order {
			order_id: order_id.into(),
		}
	}

	pub fn product(order_id: impl Into<String>, product_id: impl Into<String>) -> Self {
		Self::Product {
			order_id: order_id.into(),
			product_id: product_id.into(),
		}
	}

	pub fn order_id(&self) -> &str {
		match self {
			Self::Order { order_id } | Self::Product { order_id, .. } => order_id,
		}
	}

	/// Identifier used to persist the lines of this scope.
	pub fn storage_id(&self) -> String {
		match self {
			Self::Order { order_id } => order_id.clone(),
			Self::Product {
				order_id,
				product_id,
			} => format!("{}/{}", order_id, product_id),
		}
	}
}

impl fmt::Display for QuotationScope {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Order { order_id } => write!(f, "order {}", order_id),
			Self::Product {
				order_id,
				product_id,
			} => write!(f, "product {} of order {}", product_id, order_id),
		}
	}
}
