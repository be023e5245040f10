//! Storage-related types for the orchestrator.

use std::str::FromStr;

/// Storage keys for different data collections.
///
/// This enum provides type safety for storage operations by replacing
/// string literals with strongly typed variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageKey {
	/// Key for storing order data
	Orders,
	/// Key for storing quotation lines per scope
	QuotationLines,
	/// Key for storing contracts by contract id
	Contracts,
	/// Key for mapping order IDs to their contract ids, oldest first
	ContractsByOrder,
	/// Key for storing deposit plans per order
	PaymentPlans,
	/// Key for mapping deposit IDs to order IDs
	OrderByDeposit,
	/// Key for storing shipment records per order
	Shipments,
	/// Key for storing transition journals
	Journals,
}

impl StorageKey {
	/// Returns the string representation of the storage key.
	pub fn as_str(&self) -> &'static str {
		match self {
			StorageKey::Orders => "orders",
			StorageKey::QuotationLines => "quotation_lines",
			StorageKey::Contracts => "contracts",
			StorageKey::ContractsByOrder => "contracts_by_order",
			StorageKey::PaymentPlans => "payment_plans",
			StorageKey::OrderByDeposit => "order_by_deposit",
			StorageKey::Shipments => "shipments",
			StorageKey::Journals => "journals",
		}
	}

	/// Returns an iterator over all StorageKey variants.
	pub fn all() -> impl Iterator<Item = Self> {
		[
			Self::Orders,
			Self::QuotationLines,
			Self::Contracts,
			Self::ContractsByOrder,
			Self::PaymentPlans,
			Self::OrderByDeposit,
			Self::Shipments,
			Self::Journals,
		]
		.into_iter()
	}
}

impl FromStr for StorageKey {
	type Err = ();

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::all().find(|k| k.as_str() == s).ok_or(())
	}
}

impl From<StorageKey> for &'static str {
	fn from(key: StorageKey) -> Self {
		key.as_str()
	}
}
