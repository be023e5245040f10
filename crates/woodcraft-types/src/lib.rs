//! Common types module for the woodcraft order orchestrator.
//!
//! This module defines the core data types shared by every lifecycle component:
//! orders, quotation lines, contracts, deposits, shipments, transition journals
//! and the request context injected into orchestrator calls.

/// API types for HTTP error responses.
pub mod api;
/// Request context carrying the acting party.
pub mod context;
/// Contract types for drafting and signing.
pub mod contract;
/// Event types for lifecycle notifications.
pub mod events;
/// Transition journal types for multi-step transitions.
pub mod journal;
/// Order types shared by service and guarantee orders.
pub mod order;
/// Deposit and payment plan types.
pub mod payment;
/// Quotation line types and pricing constants.
pub mod quotation;
/// Self-registering implementation trait.
pub mod registry;
/// Redacting wrapper for tokens and credentials.
pub mod secret_string;
/// Shipment, courier and product specification types.
pub mod shipment;
/// Storage keys for persisted collections.
pub mod storage;
/// Utility functions for timestamps and display formatting.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use api::*;
pub use context::*;
pub use contract::*;
pub use events::*;
pub use journal::*;
pub use order::*;
pub use payment::*;
pub use quotation::*;
pub use registry::*;
pub use secret_string::SecretString;
pub use shipment::*;
pub use storage::*;
pub use utils::{current_timestamp, format_vnd, truncate_id};
pub use validation::*;
