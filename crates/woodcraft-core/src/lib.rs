//! Order lifecycle orchestration for the woodcraft marketplace.
//!
//! Coordinates the quotation ledger, contract manager, deposit tracker and
//! shipment coordinator to move service and guarantee orders from request
//! to delivery. The [`OrderEngine`] is the entry point; [`EngineBuilder`]
//! assembles it from configuration.

pub mod builder;
pub mod engine;
pub mod handlers;
pub mod journal;
pub mod recovery;
pub mod state;

pub use builder::{BuilderError, EngineBuilder, EngineFactories};
pub use engine::event_bus::EventBus;
pub use engine::{EngineError, EngineSettings, OrderEngine, SHIPMENT_RETRY_GUIDANCE};
pub use handlers::ScopedLines;
pub use recovery::{RecoveryReport, RecoveryService};
