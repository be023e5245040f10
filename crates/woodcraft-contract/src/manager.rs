//! Contract drafting, signing and revision history.

use crate::{AssetService, ContractError};
use chrono::{DateTime, FixedOffset, TimeZone};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};
use woodcraft_quotation::QuotationLedger;
use woodcraft_storage::StorageService;
use woodcraft_types::{
	current_timestamp, truncate_id, Contract, ContractDraft, Order, OrderKind, RequestContext,
	SignatureAsset, StorageKey,
};

/// Moves a date to 23:59:59.999 of its calendar day in `offset`.
pub fn end_of_day(
	date: DateTime<FixedOffset>,
	offset: FixedOffset,
) -> Result<DateTime<FixedOffset>, ContractError> {
	let local = date.with_timezone(&offset);
	let naive = local
		.date_naive()
		.and_hms_milli_opt(23, 59, 59, 999)
		.ok_or_else(|| ContractError::Validation(vec!["complete_date is out of range".into()]))?;
	offset
		.from_local_datetime(&naive)
		.single()
		.ok_or_else(|| ContractError::Validation(vec!["complete_date is out of range".into()]))
}

/// Checks a draft against the order it is written for.
///
/// Service orders need a warranty entry for every requested product. Every
/// warranty must reference a requested product, at most once.
pub fn validate_draft(order: &Order, draft: &ContractDraft) -> Result<(), Vec<String>> {
	let mut errors = Vec::new();

	if draft.woodworker_terms.trim().is_empty() {
		errors.push("woodworker_terms is required".to_string());
	}

	let mut seen = HashSet::new();
	for warranty in &draft.warranties {
		if order.product(&warranty.product_id).is_none() {
			errors.push(format!(
				"warranty references unknown product {}",
				warranty.product_id
			));
		} else if !seen.insert(warranty.product_id.as_str()) {
			errors.push(format!(
				"duplicate warranty for product {}",
				warranty.product_id
			));
		}
	}

	if order.kind == OrderKind::Service {
		for product in &order.requested_products {
			if !seen.contains(product.product_id.as_str()) {
				errors.push(format!("warranty missing for product {}", product.product_id));
			}
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

/// Drafts and signs contracts.
///
/// An order has at most one active contract: the newest one, which is never
/// superseded. Contracts are indexed per order, oldest first.
pub struct ContractManager {
	storage: Arc<StorageService>,
	ledger: Arc<QuotationLedger>,
	assets: Arc<AssetService>,
	offset: FixedOffset,
}

impl ContractManager {
	pub fn new(
		storage: Arc<StorageService>,
		ledger: Arc<QuotationLedger>,
		assets: Arc<AssetService>,
		offset: FixedOffset,
	) -> Self {
		Self {
			storage,
			ledger,
			assets,
			offset,
		}
	}

	/// Drafts or re-drafts the contract of an order.
	///
	/// A contract the customer has not signed yet is revised in place. A
	/// customer-signed contract is kept as is and superseded by a new one.
	pub async fn draft(
		&self,
		order: &Order,
		draft: ContractDraft,
		context: &RequestContext,
	) -> Result<Contract, ContractError> {
		if !self.ledger.is_order_quoted(order).await? {
			return Err(ContractError::PreconditionFailed(format!(
				"order {} is not fully quoted",
				order.id
			)));
		}
		validate_draft(order, &draft).map_err(ContractError::Validation)?;

		let total = self
			.ledger
			.total_for_order(order)
			.await?
			.checked_add(order.ship_fee)
			.ok_or_else(|| {
				ContractError::Validation(vec![format!(
					"ship_fee {} pushes the contract total out of range",
					order.ship_fee
				)])
			})?;
		let complete_date = end_of_day(draft.complete_date, self.offset)?;
		let woodworker_signature = match &draft.woodworker_signature {
			Some(asset) => Some(self.assets.resolve(asset, context).await?),
			None => None,
		};
		let now = current_timestamp();

		let revision = match self.get(&order.id).await? {
			Some(mut active) if !active.is_customer_signed() => {
				active.revision += 1;
				active.woodworker_terms = draft.woodworker_terms;
				active.complete_date = complete_date;
				active.timezone = self.offset.to_string();
				active.contract_total_amount = total;
				active.warranties = draft.warranties;
				active.woodworker_signature = woodworker_signature;
				active.updated_at = now;
				self.storage
					.update(StorageKey::Contracts, &active.id, &active)
					.await?;
				info!(
					order_id = %truncate_id(&order.id),
					contract_id = %truncate_id(&active.id),
					revision = active.revision,
					"Contract revised"
				);
				return Ok(active);
			},
			Some(mut signed) => {
				signed.superseded = true;
				signed.updated_at = now;
				self.storage
					.update(StorageKey::Contracts, &signed.id, &signed)
					.await?;
				signed.revision + 1
			},
			None => 1,
		};

		let contract = Contract {
			id: uuid::Uuid::new_v4().to_string(),
			order_id: order.id.clone(),
			revision,
			complete_date,
			timezone: self.offset.to_string(),
			woodworker_terms: draft.woodworker_terms,
			contract_total_amount: total,
			warranties: draft.warranties,
			woodworker_signature,
			customer_signature: None,
			superseded: false,
			created_at: now,
			updated_at: now,
		};
		self.storage
			.store(StorageKey::Contracts, &contract.id, &contract)
			.await?;

		let mut index = self.index(&order.id).await?;
		index.push(contract.id.clone());
		self.storage
			.store(StorageKey::ContractsByOrder, &order.id, &index)
			.await?;

		info!(
			order_id = %truncate_id(&order.id),
			contract_id = %truncate_id(&contract.id),
			revision = contract.revision,
			"Contract drafted"
		);
		Ok(contract)
	}

	/// Attaches the woodworker's signature to an active contract.
	pub async fn attach_woodworker_signature(
		&self,
		contract_id: &str,
		asset: &SignatureAsset,
		context: &RequestContext,
	) -> Result<Contract, ContractError> {
		let mut contract = self.get_by_id(contract_id).await?;
		ensure_active(&contract)?;
		if contract.is_customer_signed() {
			return Err(ContractError::PreconditionFailed(
				"contract is already signed by the customer".into(),
			));
		}

		let url = self.assets.resolve(asset, context).await?;
		contract.woodworker_signature = Some(url);
		contract.updated_at = current_timestamp();
		self.storage
			.update(StorageKey::Contracts, &contract.id, &contract)
			.await?;
		debug!(contract_id = %truncate_id(&contract.id), "Woodworker signature attached");
		Ok(contract)
	}

	/// Attaches the customer's signature.
	///
	/// Requires the woodworker's signature. Once the customer has signed,
	/// further attempts return the contract unchanged.
	pub async fn attach_customer_signature(
		&self,
		contract_id: &str,
		asset: &SignatureAsset,
		context: &RequestContext,
	) -> Result<Contract, ContractError> {
		let mut contract = self.get_by_id(contract_id).await?;
		ensure_active(&contract)?;
		if contract.woodworker_signature.is_none() {
			return Err(ContractError::PreconditionFailed(
				"woodworker signature is required before the customer signs".into(),
			));
		}
		if contract.is_customer_signed() {
			debug!(contract_id = %truncate_id(&contract.id), "Customer signature already attached");
			return Ok(contract);
		}

		let url = self.assets.resolve(asset, context).await?;
		contract.customer_signature = Some(url);
		contract.updated_at = current_timestamp();
		self.storage
			.update(StorageKey::Contracts, &contract.id, &contract)
			.await?;
		info!(
			order_id = %truncate_id(&contract.order_id),
			contract_id = %truncate_id(&contract.id),
			"Contract signed by both parties"
		);
		Ok(contract)
	}

	/// Active contract of an order, if any.
	pub async fn get(&self, order_id: &str) -> Result<Option<Contract>, ContractError> {
		let Some(latest) = self.index(order_id).await?.pop() else {
			return Ok(None);
		};
		let contract = self.get_by_id(&latest).await?;
		Ok((!contract.superseded).then_some(contract))
	}

	pub async fn get_by_id(&self, contract_id: &str) -> Result<Contract, ContractError> {
		self.storage
			.retrieve_optional(StorageKey::Contracts, contract_id)
			.await?
			.ok_or_else(|| ContractError::NotFound(contract_id.to_string()))
	}

	/// Every contract of an order, oldest first.
	pub async fn history(&self, order_id: &str) -> Result<Vec<Contract>, ContractError> {
		let mut contracts = Vec::new();
		for id in self.index(order_id).await? {
			contracts.push(self.get_by_id(&id).await?);
		}
		Ok(contracts)
	}

	async fn index(&self, order_id: &str) -> Result<Vec<String>, ContractError> {
		Ok(self
			.storage
			.retrieve_optional::<Vec<String>>(StorageKey::ContractsByOrder, order_id)
			.await?
			.unwrap_or_default())
	}
}

fn ensure_active(contract: &Contract) -> Result<(), ContractError> {
	if contract.superseded {
		return Err(ContractError::PreconditionFailed(format!(
			"contract {} has been superseded",
			contract.id
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::implementations::memory::MemoryAssetHost;
	use chrono::Timelike;
	use woodcraft_storage::implementations::memory::MemoryStorage;
	use woodcraft_types::{
		OrderStatus, ProductSpec, ProductWarranty, QuotationDetail, QuotationScope,
		RequestedProduct,
	};

	struct Fixture {
		ledger: Arc<QuotationLedger>,
		manager: ContractManager,
	}

	fn fixture() -> Fixture {
		let storage = Arc::new(StorageService::new(Box::new(MemoryStorage::new())));
		let ledger = Arc::new(QuotationLedger::new(storage.clone()));
		let assets = Arc::new(AssetService::new(Box::new(MemoryAssetHost::new())));
		let manager = ContractManager::new(
			storage,
			ledger.clone(),
			assets,
			FixedOffset::east_opt(7 * 3600).unwrap(),
		);
		Fixture { ledger, manager }
	}

	fn service_order() -> Order {
		let product = |id: &str| RequestedProduct {
			product_id: id.to_string(),
			name: id.to_string(),
			quantity: 1,
			category: None,
			warranty_duration: Some(12),
			spec: ProductSpec::default(),
		};
		Order {
			id: "order-1".into(),
			kind: OrderKind::Service,
			status: OrderStatus::ContractPending,
			requested_products: vec![product("p1"), product("p2")],
			install: false,
			customer_id: "c1".into(),
			woodworker_id: "w1".into(),
			total_amount: None,
			amount_paid: 0,
			amount_remaining: 0,
			ship_fee: 30_000,
			cancel_reason: None,
			defective_received_at: None,
			created_at: 0,
			updated_at: 0,
		}
	}

	fn draft() -> ContractDraft {
		ContractDraft {
			woodworker_terms: "Giao hàng đúng hẹn".into(),
			complete_date: DateTime::parse_from_rfc3339("2026-11-20T10:15:00+07:00").unwrap(),
			warranties: vec![
				ProductWarranty {
					product_id: "p1".into(),
					months: 12,
				},
				ProductWarranty {
					product_id: "p2".into(),
					months: 6,
				},
			],
			woodworker_signature: None,
		}
	}

	async fn quote(ledger: &QuotationLedger, product_id: &str, line: QuotationDetail) {
		ledger
			.add_line(&QuotationScope::product("order-1", product_id), line)
			.await
			.unwrap();
	}

	#[test]
	fn test_end_of_day_uses_contract_offset() {
		let offset = FixedOffset::east_opt(7 * 3600).unwrap();
		// 20:00 UTC on the 19th is already the 20th in +07:00
		let date = DateTime::parse_from_rfc3339("2026-11-19T20:00:00+00:00").unwrap();
		let normalized = end_of_day(date, offset).unwrap();
		assert_eq!(normalized.to_rfc3339(), "2026-11-20T23:59:59.999+07:00");
		assert_eq!(normalized.nanosecond(), 999_000_000);
	}

	#[test]
	fn test_draft_validation_messages() {
		let order = service_order();
		let mut bad = draft();
		bad.woodworker_terms = "   ".into();
		bad.warranties = vec![
			ProductWarranty {
				product_id: "p1".into(),
				months: 12,
			},
			ProductWarranty {
				product_id: "p9".into(),
				months: 12,
			},
		];
		let errors = validate_draft(&order, &bad).unwrap_err();
		assert_eq!(errors.len(), 3);
		assert!(errors.iter().any(|e| e.contains("woodworker_terms")));
		assert!(errors.iter().any(|e| e.contains("unknown product p9")));
		assert!(errors.iter().any(|e| e.contains("missing for product p2")));
	}

	#[tokio::test]
	async fn test_draft_requires_fully_quoted_order() {
		let f = fixture();
		let order = service_order();
		let ctx = RequestContext::woodworker("w1");

		quote(&f.ledger, "p1", QuotationDetail::new("Gỗ", "2", 500_000)).await;
		assert!(matches!(
			f.manager.draft(&order, draft(), &ctx).await,
			Err(ContractError::PreconditionFailed(_))
		));

		quote(&f.ledger, "p2", QuotationDetail::new("Sơn", "1", 200_000)).await;
		let contract = f.manager.draft(&order, draft(), &ctx).await.unwrap();
		assert_eq!(contract.contract_total_amount, 700_000 + 30_000);
		assert_eq!(contract.revision, 1);
		assert_eq!(contract.timezone, "+07:00");
		assert_eq!(
			contract.complete_date.to_rfc3339(),
			"2026-11-20T23:59:59.999+07:00"
		);
	}

	#[tokio::test]
	async fn test_total_overflow_is_rejected() {
		let f = fixture();
		let mut order = service_order();
		order.ship_fee = u64::MAX;
		let ctx = RequestContext::woodworker("w1");
		quote(&f.ledger, "p1", QuotationDetail::new("Gỗ", "1", 400_000)).await;
		quote(&f.ledger, "p2", QuotationDetail::new("Sơn", "1", 200_000)).await;

		let result = f.manager.draft(&order, draft(), &ctx).await;
		assert!(matches!(result, Err(ContractError::Validation(ref e)) if e[0].contains("ship_fee")));
		assert!(f.manager.get(&order.id).await.unwrap().is_none());
	}

	#[tokio::test]
	async fn test_customer_signature_needs_woodworker_signature() {
		let f = fixture();
		let order = service_order();
		let ctx = RequestContext::woodworker("w1");
		quote(&f.ledger, "p1", QuotationDetail::new("Gỗ", "2", 500_000)).await;
		quote(&f.ledger, "p2", QuotationDetail::new("Sơn", "1", 200_000)).await;
		let contract = f.manager.draft(&order, draft(), &ctx).await.unwrap();

		let customer = RequestContext::customer("c1");
		let signature = SignatureAsset::Url("https://img/customer.png".into());
		assert!(matches!(
			f.manager
				.attach_customer_signature(&contract.id, &signature, &customer)
				.await,
			Err(ContractError::PreconditionFailed(_))
		));

		f.manager
			.attach_woodworker_signature(&contract.id, &SignatureAsset::Inline("c2lnbg==".into()), &ctx)
			.await
			.unwrap();
		let signed = f
			.manager
			.attach_customer_signature(&contract.id, &signature, &customer)
			.await
			.unwrap();
		assert!(signed.is_fully_signed());
		assert!(signed
			.woodworker_signature
			.as_deref()
			.unwrap()
			.starts_with("memory://"));

		let again = f
			.manager
			.attach_customer_signature(&contract.id, &signature, &customer)
			.await
			.unwrap();
		assert_eq!(again, signed);
	}

	#[tokio::test]
	async fn test_redraft_in_place_until_customer_signs() {
		let f = fixture();
		let order = service_order();
		let ctx = RequestContext::woodworker("w1");
		quote(&f.ledger, "p1", QuotationDetail::new("Gỗ", "2", 500_000)).await;
		quote(&f.ledger, "p2", QuotationDetail::new("Sơn", "1", 200_000)).await;

		let mut signed_draft = draft();
		signed_draft.woodworker_signature = Some(SignatureAsset::Url("https://img/w.png".into()));
		let first = f.manager.draft(&order, signed_draft, &ctx).await.unwrap();

		let revised = f.manager.draft(&order, draft(), &ctx).await.unwrap();
		assert_eq!(revised.id, first.id);
		assert_eq!(revised.revision, 2);
		assert!(revised.woodworker_signature.is_none());
		assert_eq!(f.manager.history(&order.id).await.unwrap().len(), 1);
	}

	#[tokio::test]
	async fn test_redraft_after_customer_signature_supersedes() {
		let f = fixture();
		let order = service_order();
		let ctx = RequestContext::woodworker("w1");
		quote(&f.ledger, "p1", QuotationDetail::new("Gỗ", "2", 500_000)).await;
		quote(&f.ledger, "p2", QuotationDetail::new("Sơn", "1", 200_000)).await;

		let mut signed_draft = draft();
		signed_draft.woodworker_signature = Some(SignatureAsset::Url("https://img/w.png".into()));
		let first = f.manager.draft(&order, signed_draft, &ctx).await.unwrap();
		f.manager
			.attach_customer_signature(
				&first.id,
				&SignatureAsset::Url("https://img/c.png".into()),
				&RequestContext::customer("c1"),
			)
			.await
			.unwrap();

		let second = f.manager.draft(&order, draft(), &ctx).await.unwrap();
		assert_ne!(second.id, first.id);
		assert_eq!(second.revision, 2);

		let history = f.manager.history(&order.id).await.unwrap();
		assert_eq!(history.len(), 2);
		assert!(history[0].superseded);
		assert!(history[0].is_fully_signed());
		assert_eq!(f.manager.get(&order.id).await.unwrap().unwrap().id, second.id);
		assert!(matches!(
			f.manager
				.attach_woodworker_signature(
					&first.id,
					&SignatureAsset::Url("https://img/w2.png".into()),
					&ctx
				)
				.await,
			Err(ContractError::PreconditionFailed(_))
		));
	}
}
