//! Persistence of transition journals.

use std::sync::Arc;
use woodcraft_storage::StorageService;
use woodcraft_types::{Order, OrderStatus, StorageKey, TransitionJournal, TransitionKind};

use crate::engine::EngineError;

/// Stores one journal per transition attempt, keyed by journal id.
pub struct JournalStore {
	storage: Arc<StorageService>,
}

impl JournalStore {
	pub fn new(storage: Arc<StorageService>) -> Self {
		Self { storage }
	}

	/// Opens and saves a pending journal for a transition of `order`.
	pub async fn begin(
		&self,
		order: &Order,
		transition: TransitionKind,
		to_status: OrderStatus,
	) -> Result<TransitionJournal, EngineError> {
		let journal = TransitionJournal::new(
			uuid::Uuid::new_v4().to_string(),
			&order.id,
			transition,
			order.status,
			to_status,
		);
		self.save(&journal).await?;
		Ok(journal)
	}

	pub async fn save(&self, journal: &TransitionJournal) -> Result<(), EngineError> {
		self.storage
			.store(StorageKey::Journals, &journal.id, journal)
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))
	}

	/// Every journal, ordered by id.
	pub async fn all(&self) -> Result<Vec<TransitionJournal>, EngineError> {
		Ok(self
			.storage
			.list::<TransitionJournal>(StorageKey::Journals)
			.await
			.map_err(|e| EngineError::Storage(e.to_string()))?
			.into_iter()
			.map(|(_, journal)| journal)
			.collect())
	}

	/// Journals of one order, oldest first.
	pub async fn for_order(&self, order_id: &str) -> Result<Vec<TransitionJournal>, EngineError> {
		let mut journals: Vec<_> = self
			.all()
			.await?
			.into_iter()
			.filter(|j| j.order_id == order_id)
			.collect();
		journals.sort_by_key(|j| j.created_at);
		Ok(journals)
	}

	/// Journals holding a courier shipment that never reached a committed status.
	pub async fn needing_resume(&self) -> Result<Vec<TransitionJournal>, EngineError> {
		Ok(self
			.all()
			.await?
			.into_iter()
			.filter(|j| j.needs_resume())
			.collect())
	}
}
