//! Order lifecycle engine.
//!
//! The engine is the single entry point for callers. Every operation takes
//! the acting party's [`RequestContext`], checks it against the order, claims
//! the order for the duration of the call and, for status changes, wraps the
//! handler in a [`TransitionJournal`].

pub mod event_bus;
pub(crate) mod flight;

use crate::handlers::{
	ContractHandler, FulfillmentHandler, PaymentHandler, QuotationHandler, ScopedLines,
};
use crate::journal::JournalStore;
use crate::recovery::RecoveryService;
use crate::state::{OrderStateError, OrderStateMachine};
use chrono::{FixedOffset, Offset, Utc};
use event_bus::EventBus;
use flight::InFlight;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast;
use tracing::{info, instrument, warn};
use woodcraft_contract::{AssetService, ContractError, ContractManager};
use woodcraft_delivery::{CourierInterface, PackageSettings, ShipmentCoordinator, ShipmentError};
use woodcraft_payment::{DepositTracker, PaymentError};
use woodcraft_quotation::{QuotationError, QuotationLedger};
use woodcraft_storage::StorageService;
use woodcraft_types::{
	current_timestamp, truncate_id, Contract, ContractDraft, Deposit, LifecycleEvent, NewOrder,
	Order, OrderEvent, OrderKind, OrderStatus, QuotationDetail, RequestContext, Role, Shipment,
	ShipmentDirection, ShipmentDraft, SignatureAsset, TransitionJournal, TransitionKind,
	COST_CEILING, COST_STEP,
};

/// Appended to shipment creation failures.
pub const SHIPMENT_RETRY_GUIDANCE: &str = "retry the whole action once the cause is fixed";

/// Errors returned by engine operations.
#[derive(Debug, Error)]
pub enum EngineError {
	/// Input was rejected; nothing changed.
	#[error("Validation failed: {}", .0.join("; "))]
	Validation(Vec<String>),
	#[error("Precondition failed: {0}")]
	PreconditionFailed(String),
	/// The courier shipment a transition depends on could not be created.
	#[error("Shipment creation failed: {0}; {guidance}", guidance = SHIPMENT_RETRY_GUIDANCE)]
	ShipmentCreationFailed(String),
	/// A remote backend refused the call; carries its message.
	#[error("{0}")]
	RemoteService(String),
	#[error("Invalid state transition from {from} to {to}")]
	InvalidTransition { from: OrderStatus, to: OrderStatus },
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Forbidden: {0}")]
	Forbidden(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<QuotationError> for EngineError {
	fn from(err: QuotationError) -> Self {
		match err {
			QuotationError::Validation(errors) => EngineError::Validation(errors),
			QuotationError::LineNotFound(id) => {
				EngineError::NotFound(format!("quotation line {}", id))
			},
			QuotationError::Storage(msg) => EngineError::Storage(msg),
		}
	}
}

impl From<ContractError> for EngineError {
	fn from(err: ContractError) -> Self {
		match err {
			ContractError::Validation(errors) => EngineError::Validation(errors),
			ContractError::PreconditionFailed(msg) => EngineError::PreconditionFailed(msg),
			ContractError::NotFound(id) => EngineError::NotFound(format!("contract {}", id)),
			ContractError::Asset(msg) => EngineError::RemoteService(msg),
			ContractError::Storage(msg) => EngineError::Storage(msg),
		}
	}
}

impl From<PaymentError> for EngineError {
	fn from(err: PaymentError) -> Self {
		match err {
			PaymentError::Validation(msg) => EngineError::Validation(vec![msg]),
			PaymentError::PlanNotFound(order_id) => {
				EngineError::NotFound(format!("payment plan of order {}", order_id))
			},
			PaymentError::DepositNotFound(id) => EngineError::NotFound(format!("deposit {}", id)),
			PaymentError::Conflict(msg) => EngineError::Conflict(msg),
			PaymentError::Storage(msg) => EngineError::Storage(msg),
		}
	}
}

impl From<ShipmentError> for EngineError {
	fn from(err: ShipmentError) -> Self {
		match err {
			e @ ShipmentError::MissingShipment { .. } => {
				EngineError::ShipmentCreationFailed(e.to_string())
			},
			ShipmentError::CreationFailed(msg) => EngineError::ShipmentCreationFailed(msg),
			e @ ShipmentError::AlreadyCreated { .. } => {
				EngineError::PreconditionFailed(e.to_string())
			},
			e @ ShipmentError::CodeConflict { .. } => EngineError::Conflict(e.to_string()),
			ShipmentError::Storage(msg) => EngineError::Storage(msg),
		}
	}
}

impl From<OrderStateError> for EngineError {
	fn from(err: OrderStateError) -> Self {
		match err {
			OrderStateError::InvalidTransition { from, to } => {
				EngineError::InvalidTransition { from, to }
			},
			e @ OrderStateError::KindMismatch { .. } => {
				EngineError::PreconditionFailed(e.to_string())
			},
			OrderStateError::OrderNotFound(id) => EngineError::NotFound(format!("order {}", id)),
			OrderStateError::Storage(msg) => EngineError::Storage(msg),
		}
	}
}

/// Settings the engine's components are built with.
#[derive(Debug, Clone)]
pub struct EngineSettings {
	/// Timezone contract completion dates are normalized in.
	pub contract_offset: FixedOffset,
	/// Default deposit percentages, summing to 100. Empty leaves deposits to
	/// `record_deposit`.
	pub deposit_schedule: Vec<u8>,
	pub package: PackageSettings,
	pub event_capacity: usize,
}

impl Default for EngineSettings {
	fn default() -> Self {
		Self {
			contract_offset: FixedOffset::east_opt(7 * 3600).unwrap_or(Utc.fix()),
			deposit_schedule: vec![30, 70],
			package: PackageSettings::default(),
			event_capacity: 1024,
		}
	}
}

/// Party an operation must be performed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Party {
	Customer,
	Woodworker,
	/// Either party of the order.
	Any,
}

fn authorize(order: &Order, context: &RequestContext, party: Party) -> Result<(), EngineError> {
	if context.is_admin() {
		return Ok(());
	}
	let is_customer = context.role == Role::Customer && context.actor_id == order.customer_id;
	let is_woodworker =
		context.role == Role::Woodworker && context.actor_id == order.woodworker_id;
	let allowed = match party {
		Party::Customer => is_customer,
		Party::Woodworker => is_woodworker,
		Party::Any => is_customer || is_woodworker,
	};
	if allowed {
		Ok(())
	} else {
		Err(EngineError::Forbidden(format!(
			"{} {} cannot act on order {}",
			context.role, context.actor_id, order.id
		)))
	}
}

fn validate_new_order(request: &NewOrder) -> Result<(), Vec<String>> {
	let mut errors = Vec::new();
	if request.woodworker_id.trim().is_empty() {
		errors.push("woodworker_id is required".to_string());
	}
	match (request.kind, request.requested_products.len()) {
		(_, 0) => errors.push("at least one requested product is required".to_string()),
		(OrderKind::Guarantee, n) if n > 1 => {
			errors.push(format!("guarantee orders cover exactly one product, got {}", n))
		},
		_ => {},
	}
	if request.ship_fee > COST_CEILING {
		errors.push(format!(
			"ship_fee {} must not exceed {}",
			request.ship_fee, COST_CEILING
		));
	} else if request.ship_fee % COST_STEP != 0 {
		errors.push(format!(
			"ship_fee {} must be a multiple of {}",
			request.ship_fee, COST_STEP
		));
	}

	let mut seen = HashSet::new();
	for (i, product) in request.requested_products.iter().enumerate() {
		let n = i + 1;
		if product.product_id.trim().is_empty() {
			errors.push(format!("product {}: product_id is required", n));
		} else if !seen.insert(product.product_id.as_str()) {
			errors.push(format!(
				"product {}: duplicate product_id {}",
				n, product.product_id
			));
		}
		if product.quantity == 0 {
			errors.push(format!("product {}: quantity must be at least 1", n));
		}
	}

	if errors.is_empty() {
		Ok(())
	} else {
		Err(errors)
	}
}

/// Orchestrates the order lifecycle across the quotation ledger, contract
/// manager, deposit tracker and shipment coordinator.
pub struct OrderEngine {
	state_machine: Arc<OrderStateMachine>,
	contracts: Arc<ContractManager>,
	deposits: Arc<DepositTracker>,
	shipments: Arc<ShipmentCoordinator>,
	journals: Arc<JournalStore>,
	quotation_handler: QuotationHandler,
	contract_handler: ContractHandler,
	payment_handler: PaymentHandler,
	fulfillment_handler: FulfillmentHandler,
	event_bus: EventBus,
	flights: InFlight,
}

impl OrderEngine {
	pub fn new(
		storage: Arc<StorageService>,
		courier: Arc<dyn CourierInterface>,
		assets: Arc<AssetService>,
		settings: EngineSettings,
	) -> Self {
		let state_machine = Arc::new(OrderStateMachine::new(storage.clone()));
		let ledger = Arc::new(QuotationLedger::new(storage.clone()));
		let contracts = Arc::new(ContractManager::new(
			storage.clone(),
			ledger.clone(),
			assets,
			settings.contract_offset,
		));
		let deposits = Arc::new(DepositTracker::new(
			storage.clone(),
			settings.deposit_schedule,
		));
		let shipments = Arc::new(ShipmentCoordinator::new(
			storage.clone(),
			courier,
			settings.package,
		));
		let journals = Arc::new(JournalStore::new(storage));
		let event_bus = EventBus::new(settings.event_capacity);

		let quotation_handler = QuotationHandler::new(ledger.clone(), state_machine.clone());
		let contract_handler = ContractHandler::new(
			contracts.clone(),
			deposits.clone(),
			state_machine.clone(),
			event_bus.clone(),
		);
		let payment_handler =
			PaymentHandler::new(deposits.clone(), state_machine.clone(), event_bus.clone());
		let fulfillment_handler = FulfillmentHandler::new(
			shipments.clone(),
			journals.clone(),
			state_machine.clone(),
			event_bus.clone(),
		);

		Self {
			state_machine,
			contracts,
			deposits,
			shipments,
			journals,
			quotation_handler,
			contract_handler,
			payment_handler,
			fulfillment_handler,
			event_bus,
			flights: InFlight::default(),
		}
	}

	/// Subscribes to lifecycle events.
	pub fn subscribe(&self) -> broadcast::Receiver<LifecycleEvent> {
		self.event_bus.subscribe()
	}

	/// Recovery service sharing this engine's components and in-flight claims.
	pub fn recovery(&self) -> RecoveryService {
		RecoveryService::new(
			self.journals.clone(),
			self.shipments.clone(),
			self.state_machine.clone(),
			self.event_bus.clone(),
			self.flights.clone(),
		)
	}

	async fn load(
		&self,
		order_id: &str,
		context: &RequestContext,
		party: Party,
	) -> Result<Order, EngineError> {
		let order = self.state_machine.get_order(order_id).await?;
		authorize(&order, context, party)?;
		Ok(order)
	}

	/// Finishes a journaled transition: commits or fails the journal, saves
	/// it and publishes the outcome.
	async fn conclude<T>(
		&self,
		mut journal: TransitionJournal,
		result: Result<T, EngineError>,
	) -> Result<T, EngineError> {
		match &result {
			Ok(_) => {
				journal.commit();
				if journal.is_status_committed() && journal.from_status != journal.to_status {
					self.event_bus
						.publish(LifecycleEvent::Order(OrderEvent::StatusChanged {
							order_id: journal.order_id.clone(),
							from: journal.from_status,
							to: journal.to_status,
						}))
						.ok();
				}
			},
			Err(e) => {
				warn!(
					order_id = %truncate_id(&journal.order_id),
					transition = %journal.transition,
					error = %e,
					"Transition failed"
				);
				journal.fail(e.to_string());
				self.event_bus
					.publish(LifecycleEvent::Order(OrderEvent::TransitionFailed {
						order_id: journal.order_id.clone(),
						transition: journal.transition,
						error: e.to_string(),
					}))
					.ok();
			},
		}
		if let Err(e) = self.journals.save(&journal).await {
			warn!(journal_id = %truncate_id(&journal.id), error = %e, "Failed to save journal");
		}
		result
	}

	/// Creates an order for the calling customer.
	#[instrument(skip_all, fields(woodworker_id = %truncate_id(&request.woodworker_id)))]
	pub async fn create_order(
		&self,
		request: NewOrder,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		if !matches!(context.role, Role::Customer | Role::Admin) {
			return Err(EngineError::Forbidden(format!(
				"{} {} cannot place orders",
				context.role, context.actor_id
			)));
		}
		validate_new_order(&request).map_err(EngineError::Validation)?;

		let now = current_timestamp();
		let order = Order {
			id: uuid::Uuid::new_v4().to_string(),
			kind: request.kind,
			status: OrderStatus::Requested,
			requested_products: request.requested_products,
			install: request.install,
			customer_id: context.actor_id.clone(),
			woodworker_id: request.woodworker_id,
			total_amount: None,
			amount_paid: 0,
			amount_remaining: 0,
			ship_fee: request.ship_fee,
			cancel_reason: None,
			defective_received_at: None,
			created_at: now,
			updated_at: now,
		};
		self.state_machine.store_order(&order).await?;

		info!(
			order_id = %truncate_id(&order.id),
			kind = %order.kind,
			products = order.requested_products.len(),
			"Order created"
		);
		self.event_bus
			.publish(LifecycleEvent::Order(OrderEvent::Created {
				order_id: order.id.clone(),
				kind: order.kind,
			}))
			.ok();
		Ok(order)
	}

	pub async fn get_order(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		self.load(order_id, context, Party::Any).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn begin_quoting(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(&order, TransitionKind::BeginQuoting, OrderStatus::Quoting)
			.await?;
		let result = self.quotation_handler.begin(&order, &mut journal).await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn add_quotation(
		&self,
		order_id: &str,
		product_id: Option<&str>,
		line: QuotationDetail,
		context: &RequestContext,
	) -> Result<QuotationDetail, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.quotation_handler
			.add_line(&order, product_id, line)
			.await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn remove_quotation(
		&self,
		order_id: &str,
		product_id: Option<&str>,
		line_id: &str,
		context: &RequestContext,
	) -> Result<(), EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.quotation_handler
			.remove_line(&order, product_id, line_id)
			.await
	}

	/// Replaces the lines of one scope; all lines are validated before any
	/// is written.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn set_quotation(
		&self,
		order_id: &str,
		product_id: Option<&str>,
		lines: Vec<QuotationDetail>,
		context: &RequestContext,
	) -> Result<Vec<QuotationDetail>, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.quotation_handler
			.set_lines(&order, product_id, lines)
			.await
	}

	pub async fn quotation_lines(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Vec<ScopedLines>, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		self.quotation_handler.lines(&order).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn submit_quotation(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(
				&order,
				TransitionKind::SubmitQuotation,
				OrderStatus::ContractPending,
			)
			.await?;
		let result = self.quotation_handler.submit(&order, &mut journal).await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn draft_contract(
		&self,
		order_id: &str,
		draft: ContractDraft,
		context: &RequestContext,
	) -> Result<Contract, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(
				&order,
				TransitionKind::DraftContract,
				OrderStatus::ContractPending,
			)
			.await?;
		let result = self
			.contract_handler
			.draft(&order, draft, context, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn sign_contract_as_woodworker(
		&self,
		order_id: &str,
		signature: SignatureAsset,
		context: &RequestContext,
	) -> Result<Contract, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.contract_handler
			.sign_as_woodworker(&order, &signature, context)
			.await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn sign_contract_as_customer(
		&self,
		order_id: &str,
		signature: SignatureAsset,
		context: &RequestContext,
	) -> Result<Contract, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Customer).await?;
		let mut journal = self
			.journals
			.begin(
				&order,
				TransitionKind::SignContract,
				OrderStatus::ContractSigned,
			)
			.await?;
		let result = self
			.contract_handler
			.sign_as_customer(&order, &signature, context, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	/// Adds an installment to a signed order's deposit plan.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn record_deposit(
		&self,
		order_id: &str,
		amount: u64,
		percent: u8,
		context: &RequestContext,
	) -> Result<Deposit, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.payment_handler.record(&order, amount, percent).await
	}

	/// Pays one deposit. The order is resolved from the deposit.
	#[instrument(skip_all, fields(deposit_id = %truncate_id(deposit_id)))]
	pub async fn pay_deposit(
		&self,
		deposit_id: &str,
		context: &RequestContext,
	) -> Result<Deposit, EngineError> {
		let order_id = self.deposits.order_for_deposit(deposit_id).await?;
		let _flight = self.flights.acquire(&order_id)?;
		let order = self.load(&order_id, context, Party::Customer).await?;
		self.payment_handler.pay(&order, deposit_id).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn start_production(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(&order, TransitionKind::StartProduction, OrderStatus::InProgress)
			.await?;
		let result = self
			.payment_handler
			.start_production(&order, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	/// Registers the addresses of a shipment. Either party may provide them.
	#[instrument(skip_all, fields(order_id = %truncate_id(order_id), direction = %direction))]
	pub async fn register_shipment(
		&self,
		order_id: &str,
		direction: ShipmentDirection,
		draft: ShipmentDraft,
		context: &RequestContext,
	) -> Result<Shipment, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Any).await?;
		self.fulfillment_handler
			.register_shipment(&order, direction, draft)
			.await
	}

	pub async fn shipments(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Vec<Shipment>, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		self.fulfillment_handler.shipments(&order.id).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn accept_free_guarantee(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(
				&order,
				TransitionKind::AcceptFreeGuarantee,
				OrderStatus::FreeGuaranteeAccepted,
			)
			.await?;
		let result = self
			.fulfillment_handler
			.accept_free_guarantee(&order, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn confirm_defective_received(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		self.fulfillment_handler
			.confirm_defective_received(&order)
			.await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn finish_and_ship(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Woodworker).await?;
		let mut journal = self
			.journals
			.begin(&order, TransitionKind::FinishAndShip, OrderStatus::ShippedOut)
			.await?;
		let result = self
			.fulfillment_handler
			.finish_and_ship(&order, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn confirm_receipt(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Customer).await?;
		let mut journal = self
			.journals
			.begin(&order, TransitionKind::ConfirmReceipt, OrderStatus::Completed)
			.await?;
		let result = self
			.fulfillment_handler
			.confirm_receipt(&order, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	#[instrument(skip_all, fields(order_id = %truncate_id(order_id)))]
	pub async fn cancel(
		&self,
		order_id: &str,
		reason: &str,
		context: &RequestContext,
	) -> Result<Order, EngineError> {
		let _flight = self.flights.acquire(order_id)?;
		let order = self.load(order_id, context, Party::Any).await?;
		let mut journal = self
			.journals
			.begin(&order, TransitionKind::Cancel, OrderStatus::Cancelled)
			.await?;
		let result = self
			.fulfillment_handler
			.cancel(&order, reason, &mut journal)
			.await;
		self.conclude(journal, result).await
	}

	/// Active contract of an order.
	pub async fn contract(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Contract, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		self.contracts
			.get(&order.id)
			.await?
			.ok_or_else(|| EngineError::NotFound(format!("contract of order {}", order.id)))
	}

	/// Every contract of an order, oldest first.
	pub async fn contract_history(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Vec<Contract>, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		Ok(self.contracts.history(&order.id).await?)
	}

	pub async fn deposits(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Vec<Deposit>, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		Ok(self.deposits.deposits(&order.id).await?)
	}

	pub async fn journals(
		&self,
		order_id: &str,
		context: &RequestContext,
	) -> Result<Vec<TransitionJournal>, EngineError> {
		let order = self.load(order_id, context, Party::Any).await?;
		self.journals.for_order(&order.id).await
	}
}
