//! Quotation ledger for the woodcraft orchestrator.
//!
//! The ledger keeps itemized cost lines per quotation scope: one scope per
//! requested product for service orders, and a single order-wide scope for
//! guarantee claims. A scope is quoted once it holds at least one line.

use std::sync::Arc;
use thiserror::Error;
use tracing::debug;
use woodcraft_storage::{StorageError, StorageService};
use woodcraft_types::{
	truncate_id, Order, OrderKind, QuotationDetail, QuotationScope, StorageKey, COST_CEILING,
	COST_MIN, COST_STEP,
};

/// Errors that can occur during quotation operations.
#[derive(Debug, Error)]
pub enum QuotationError {
	/// One message per offending line; nothing was saved.
	#[error("Invalid quotation lines: {}", .0.join("; "))]
	Validation(Vec<String>),
	/// The line to remove does not exist in the scope.
	#[error("Quotation line not found: {0}")]
	LineNotFound(String),
	/// Error that occurs while persisting lines.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<StorageError> for QuotationError {
	fn from(err: StorageError) -> Self {
		QuotationError::Storage(err.to_string())
	}
}

/// Validates every line, collecting one message per offending line.
///
/// Line numbers in messages are 1-based.
pub fn validate_lines(lines: &[QuotationDetail]) -> Result<(), Vec<String>> {
	let mut errors = Vec::new();
	for (index, line) in lines.iter().enumerate() {
		let mut problems = Vec::new();
		if line.cost_type.trim().is_empty() {
			problems.push("cost_type is required".to_string());
		}
		if line.quantity_required.trim().is_empty() {
			problems.push("quantity_required is required".to_string());
		}
		if line.cost_amount < COST_MIN || line.cost_amount > COST_CEILING {
			problems.push(format!(
				"cost_amount {} must be between {} and {}",
				line.cost_amount, COST_MIN, COST_CEILING
			));
		} else if line.cost_amount % COST_STEP != 0 {
			problems.push(format!(
				"cost_amount {} must be a multiple of {}",
				line.cost_amount, COST_STEP
			));
		}
		if !problems.is_empty() {
			errors.push(format!("line {}: {}", index + 1, problems.join(", ")));
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

/// Scopes that must be quoted before an order counts as quoted.
pub fn order_scopes(order: &Order) -> Vec<QuotationScope> {
	match order.kind {
		OrderKind::Service => order
			.requested_products
			.iter()
			.map(|p| QuotationScope::product(&order.id, &p.product_id))
			.collect(),
		OrderKind::Guarantee => vec![QuotationScope::order(&order.id)],
	}
}

/// Itemized cost lines keyed by scope.
pub struct QuotationLedger {
	storage: Arc<StorageService>,
}

impl QuotationLedger {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Lines of a scope, in insertion order.
	pub async fn lines(&self, scope: &QuotationScope) -> Result<Vec<QuotationDetail>, QuotationError> {
		Ok(self
			.storage
			.retrieve_optional::<Vec<QuotationDetail>>(StorageKey::QuotationLines, &scope.storage_id())
			.await?
			.unwrap_or_default())
	}

	/// Appends a line after validating the resulting set.
	pub async fn add_line(
		&self,
		scope: &QuotationScope,
		line: QuotationDetail,
	) -> Result<QuotationDetail, QuotationError> {
		let mut lines = self.lines(scope).await?;
		let line = with_id(line);
		lines.push(line.clone());
		self.commit(scope, lines).await?;
		Ok(line)
	}

	/// Removes one line by id.
	pub async fn remove_line(
		&self,
		scope: &QuotationScope,
		line_id: &str,
	) -> Result<(), QuotationError> {
		let mut lines = self.lines(scope).await?;
		let before = lines.len();
		lines.retain(|l| l.id != line_id);
		if lines.len() == before {
			return Err(QuotationError::LineNotFound(line_id.to_string()));
		}
		self.commit(scope, lines).await
	}

	/// Replaces every line of a scope. An empty set clears the scope.
	pub async fn set_lines(
		&self,
		scope: &QuotationScope,
		lines: Vec<QuotationDetail>,
	) -> Result<Vec<QuotationDetail>, QuotationError> {
		let lines: Vec<QuotationDetail> = lines.into_iter().map(with_id).collect();
		self.commit(scope, lines.clone()).await?;
		Ok(lines)
	}

	pub async fn total_for(&self, scope: &QuotationScope) -> Result<u64, QuotationError> {
		Ok(self.lines(scope).await?.iter().map(|l| l.cost_amount).sum())
	}

	/// Sum of every scope of the order.
	pub async fn total_for_order(&self, order: &Order) -> Result<u64, QuotationError> {
		let mut total = 0;
		for scope in order_scopes(order) {
			total += self.total_for(&scope).await?;
		}
		Ok(total)
	}

	pub async fn is_quoted(&self, scope: &QuotationScope) -> Result<bool, QuotationError> {
		Ok(!self.lines(scope).await?.is_empty())
	}

	/// True when every scope of the order holds at least one line.
	///
	/// An order without requested products is never quoted.
	pub async fn is_order_quoted(&self, order: &Order) -> Result<bool, QuotationError> {
		if order.requested_products.is_empty() {
			return Ok(false);
		}
		for scope in order_scopes(order) {
			if !self.is_quoted(&scope).await? {
				return Ok(false);
			}
		}
		Ok(true)
	}

	/// Validates all lines, then saves them in one write.
	async fn commit(
		&self,
		scope: &QuotationScope,
		lines: Vec<QuotationDetail>,
	) -> Result<(), QuotationError> {
		validate_lines(&lines).map_err(QuotationError::Validation)?;

		let id = scope.storage_id();
		if lines.is_empty() {
			self.storage.remove(StorageKey::QuotationLines, &id).await?;
		} else {
			self.storage
				.store(StorageKey::QuotationLines, &id, &lines)
				.await?;
		}
		debug!(
			order_id = %truncate_id(scope.order_id()),
			scope = %scope,
			lines = lines.len(),
			"Saved quotation lines"
		);
		Ok(())
	}
}

fn with_id(mut line: QuotationDetail) -> QuotationDetail {
	if line.id.trim().is_empty() {
		line.id = uuid::Uuid::new_v4().to_string();
	}
	line
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_storage::implementations::memory::MemoryStorage;
	use woodcraft_types::{OrderStatus, ProductSpec, RequestedProduct};

	fn ledger() -> QuotationLedger {
		QuotationLedger::new(Arc::new(StorageService::new(Box::new(MemoryStorage::new()))))
	}

	fn product(id: &str) -> RequestedProduct {
		RequestedProduct {
			product_id: id.to_string(),
			name: format!("Sản phẩm {}", id),
			quantity: 1,
			category: None,
			warranty_duration: Some(12),
			spec: ProductSpec::default(),
		}
	}

	fn order(kind: OrderKind, products: Vec<RequestedProduct>) -> Order {
		Order {
			id: "order-1".into(),
			kind,
			status: OrderStatus::Quoting,
			requested_products: products,
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
	fn test_cost_amount_step_and_range() {
		for amount in [1_000, 500_000, 50_000_000] {
			assert!(validate_lines(&[QuotationDetail::new("Gỗ", "1", amount)]).is_ok());
		}
		for amount in [0, 999, 1_500, 50_001_000] {
			assert!(validate_lines(&[QuotationDetail::new("Gỗ", "1", amount)]).is_err());
		}
	}

	#[test]
	fn test_validation_reports_each_bad_line() {
		let lines = vec![
			QuotationDetail::new("Gỗ", "2", 500_000),
			QuotationDetail::new("  ", "1", 1_500),
			QuotationDetail::new("Sơn", "", 200_000),
		];
		let errors = validate_lines(&lines).unwrap_err();
		assert_eq!(errors.len(), 2);
		assert!(errors[0].starts_with("line 2:"));
		assert!(errors[0].contains("cost_type"));
		assert!(errors[0].contains("multiple of 1000"));
		assert!(errors[1].starts_with("line 3:"));
	}

	#[tokio::test]
	async fn test_invalid_save_commits_nothing() {
		let ledger = ledger();
		let scope = QuotationScope::product("order-1", "p1");

		let result = ledger
			.set_lines(
				&scope,
				vec![
					QuotationDetail::new("Gỗ", "2", 500_000),
					QuotationDetail::new("Sơn", "1", 200_500),
				],
			)
			.await;
		assert!(matches!(result, Err(QuotationError::Validation(ref e)) if e.len() == 1));
		assert!(ledger.lines(&scope).await.unwrap().is_empty());
		assert!(!ledger.is_quoted(&scope).await.unwrap());
	}

	#[tokio::test]
	async fn test_add_and_remove_lines() {
		let ledger = ledger();
		let scope = QuotationScope::order("order-1");

		let line = ledger
			.add_line(&scope, QuotationDetail::new("Công sửa", "1", 300_000))
			.await
			.unwrap();
		assert!(!line.id.is_empty());
		ledger
			.add_line(&scope, QuotationDetail::new("Keo", "2", 50_000))
			.await
			.unwrap();
		assert_eq!(ledger.total_for(&scope).await.unwrap(), 350_000);

		ledger.remove_line(&scope, &line.id).await.unwrap();
		assert_eq!(ledger.total_for(&scope).await.unwrap(), 50_000);
		assert!(matches!(
			ledger.remove_line(&scope, &line.id).await,
			Err(QuotationError::LineNotFound(_))
		));
	}

	#[tokio::test]
	async fn test_service_order_quoted_only_when_every_product_is() {
		let ledger = ledger();
		let order = order(OrderKind::Service, vec![product("p1"), product("p2")]);

		ledger
			.add_line(
				&QuotationScope::product(&order.id, "p1"),
				QuotationDetail::new("Gỗ", "2", 500_000),
			)
			.await
			.unwrap();
		assert!(!ledger.is_order_quoted(&order).await.unwrap());

		ledger
			.add_line(
				&QuotationScope::product(&order.id, "p2"),
				QuotationDetail::new("Sơn", "1", 200_000),
			)
			.await
			.unwrap();
		assert!(ledger.is_order_quoted(&order).await.unwrap());
		assert_eq!(ledger.total_for_order(&order).await.unwrap(), 700_000);
	}

	#[tokio::test]
	async fn test_guarantee_order_uses_order_scope() {
		let ledger = ledger();
		let order = order(OrderKind::Guarantee, vec![product("p1")]);

		ledger
			.add_line(
				&QuotationScope::product(&order.id, "p1"),
				QuotationDetail::new("Gỗ", "1", 100_000),
			)
			.await
			.unwrap();
		assert!(!ledger.is_order_quoted(&order).await.unwrap());

		ledger
			.add_line(
				&QuotationScope::order(&order.id),
				QuotationDetail::new("Công sửa", "1", 150_000),
			)
			.await
			.unwrap();
		assert!(ledger.is_order_quoted(&order).await.unwrap());
		assert_eq!(ledger.total_for_order(&order).await.unwrap(), 150_000);
	}

	#[tokio::test]
	async fn test_order_without_products_is_never_quoted() {
		let ledger = ledger();
		let order = order(OrderKind::Service, vec![]);
		assert!(!ledger.is_order_quoted(&order).await.unwrap());
	}
}
