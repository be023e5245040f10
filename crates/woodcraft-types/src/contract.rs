//! Contract types.
//!
//! A contract binds the price, the completion date and the per-product
//! warranty of an order. It is signed first by the woodworker and then by the
//! customer; a customer-signed contract is never edited in place.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// Legal contract drafted for an order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Contract {
	pub id: String,
	pub order_id: String,
	/// Bumped on every in-place re-draft.
	pub revision: u32,
	/// Inclusive completion deadline, normalized to the end of its day.
	pub complete_date: DateTime<FixedOffset>,
	/// Fixed UTC offset the contract dates are expressed in, e.g. `+07:00`.
	pub timezone: String,
	pub woodworker_terms: String,
	pub contract_total_amount: u64,
	pub warranties: Vec<ProductWarranty>,
	/// URL of the woodworker's signature image.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub woodworker_signature: Option<String>,
	/// URL of the customer's signature image.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub customer_signature: Option<String>,
	/// Replaced by a newer contract for the same order.
	#[serde(default)]
	pub superseded: bool,
	pub created_at: u64,
	pub updated_at: u64,
}

impl Contract {
	pub fn is_customer_signed(&self) -> bool {
		self.customer_signature.is_some()
	}

	pub fn is_fully_signed(&self) -> bool {
		self.woodworker_signature.is_some() && self.customer_signature.is_some()
	}
}

/// Warranty duration granted for one requested product.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ProductWarranty {
	pub product_id: String,
	pub months: u32,
}

/// Woodworker input for drafting or re-drafting a contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDraft {
	pub woodworker_terms: String,
	pub complete_date: DateTime<FixedOffset>,
	#[serde(default)]
	pub warranties: Vec<ProductWarranty>,
	/// Woodworker signature supplied together with the draft.
	#[serde(default)]
	pub woodworker_signature: Option<SignatureAsset>,
}

/// A signature image, either already hosted or still inline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum SignatureAsset {
	/// Image already uploaded to the asset host.
	Url(String),
	/// Base64 image data that must be uploaded before attaching.
	Inline(String),
}
