//! Recovery of transitions interrupted after a courier shipment was created.
//!
//! When a transition fails between receiving a courier order code and
//! committing the new status, the journal still holds the code. Recovery
//! stores that code on the shipment record and commits the target status,
//! so the courier is never asked for the same shipment twice.

use crate::engine::event_bus::EventBus;
use crate::engine::flight::InFlight;
use crate::engine::EngineError;
use crate::journal::JournalStore;
use crate::state::OrderStateMachine;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use woodcraft_delivery::ShipmentCoordinator;
use woodcraft_types::{
	truncate_id, JournalStep, LifecycleEvent, OrderEvent, ShipmentDirection,
	TransitionJournal, TransitionKind,
};

/// Outcome of a recovery pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecoveryReport {
	/// Journals that needed resuming.
	pub scanned: usize,
	pub resumed: usize,
	/// Journals not resumed. Those whose order moved on are closed as abandoned.
	pub skipped: usize,
}

enum Resumed {
	Committed,
	/// The order already reached the target status.
	AlreadyApplied,
	/// Left untouched or abandoned.
	Skipped,
}

pub struct RecoveryService {
	journals: Arc<JournalStore>,
	shipments: Arc<ShipmentCoordinator>,
	state_machine: Arc<OrderStateMachine>,
	event_bus: EventBus,
	flights: InFlight,
}

impl RecoveryService {
	pub(crate) fn new(
		journals: Arc<JournalStore>,
		shipments: Arc<ShipmentCoordinator>,
		state_machine: Arc<OrderStateMachine>,
		event_bus: EventBus,
		flights: InFlight,
	) -> Self {
		Self {
			journals,
			shipments,
			state_machine,
			event_bus,
			flights,
		}
	}

	/// Resumes every journal holding an unrecorded courier shipment.
	#[instrument(skip_all)]
	pub async fn recover(&self) -> Result<RecoveryReport, EngineError> {
		let pending = self.journals.needing_resume().await?;
		let mut report = RecoveryReport {
			scanned: pending.len(),
			..Default::default()
		};

		for mut journal in pending {
			match self.resume(&mut journal).await {
				Ok(Resumed::Committed) | Ok(Resumed::AlreadyApplied) => report.resumed += 1,
				Ok(Resumed::Skipped) => report.skipped += 1,
				Err(e) => {
					warn!(
						journal_id = %truncate_id(&journal.id),
						order_id = %truncate_id(&journal.order_id),
						error = %e,
						"Failed to resume transition"
					);
					report.skipped += 1;
				},
			}
			if let Err(e) = self.journals.save(&journal).await {
				warn!(journal_id = %truncate_id(&journal.id), error = %e, "Failed to save journal");
			}
		}

		if report.scanned > 0 {
			info!(
				scanned = report.scanned,
				resumed = report.resumed,
				skipped = report.skipped,
				"Recovery pass finished"
			);
		}
		Ok(report)
	}

	async fn resume(&self, journal: &mut TransitionJournal) -> Result<Resumed, EngineError> {
		let _flight = self.flights.acquire(&journal.order_id)?;

		let order = self.state_machine.get_order(&journal.order_id).await?;
		let moved_on = order.status != journal.from_status;

		if let Err(e) = self.record_codes(journal).await {
			if !moved_on {
				return Err(e);
			}
			warn!(
				order_id = %truncate_id(&order.id),
				status = %order.status,
				error = %e,
				"Courier code left unrecorded, order moved on"
			);
			journal.abandon(format!("order moved on to {}: {}", order.status, e));
			return Ok(Resumed::Skipped);
		}

		if order.status == journal.to_status {
			journal.commit();
			return Ok(Resumed::AlreadyApplied);
		}
		if moved_on {
			warn!(
				order_id = %truncate_id(&order.id),
				status = %order.status,
				expected = %journal.from_status,
				"Order moved on, status left unchanged"
			);
			journal.abandon(format!("order moved on to {}", order.status));
			return Ok(Resumed::Skipped);
		}

		let transition = journal.transition;
		self.state_machine
			.transition_with(&order.id, journal.to_status, |o| {
				if transition == TransitionKind::AcceptFreeGuarantee {
					o.total_amount = Some(0);
					o.amount_remaining = 0;
				}
			})
			.await?;
		journal.record(JournalStep::StatusCommitted {
			status: journal.to_status,
		});
		journal.commit();

		info!(
			order_id = %truncate_id(&order.id),
			transition = %transition,
			status = %journal.to_status,
			"Transition resumed"
		);
		self.event_bus
			.publish(LifecycleEvent::Order(OrderEvent::StatusChanged {
				order_id: order.id.clone(),
				from: journal.from_status,
				to: journal.to_status,
			}))
			.ok();
		Ok(Resumed::Committed)
	}

	/// Stores every courier code the journal obtained but never recorded.
	async fn record_codes(&self, journal: &mut TransitionJournal) -> Result<(), EngineError> {
		for direction in [ShipmentDirection::Inbound, ShipmentDirection::Outbound] {
			let Some(code) = journal.courier_code(direction).map(str::to_string) else {
				continue;
			};
			if journal.is_code_recorded(direction) {
				continue;
			}
			self.shipments
				.record_order_code(&journal.order_id, &code, direction)
				.await?;
			journal.record(JournalStep::OrderCodeRecorded {
				direction,
				order_code: code,
			});
		}
		Ok(())
	}
}

