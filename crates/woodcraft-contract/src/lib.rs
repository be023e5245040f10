//! Contract management for the woodcraft orchestrator.
//!
//! This crate drafts contracts from the quotation ledger, captures the
//! woodworker and customer signatures, and keeps the revision history of an
//! order's contracts. Signature images are hosted externally through the
//! asset host seam defined here.

use async_trait::async_trait;
use thiserror::Error;
use woodcraft_types::{ConfigSchema, ImplementationRegistry, RequestContext, SecretString, SignatureAsset};

mod manager;

pub use manager::{end_of_day, validate_draft, ContractManager};

/// Re-export implementations
pub mod implementations {
	pub mod http;
	pub mod memory;
}

/// Errors that can occur during contract operations.
#[derive(Debug, Error)]
pub enum ContractError {
	/// One message per problem with the draft; nothing was saved.
	#[error("Invalid contract draft: {}", .0.join("; "))]
	Validation(Vec<String>),
	/// The contract cannot move forward in its current state.
	#[error("Precondition failed: {0}")]
	PreconditionFailed(String),
	/// Error that occurs when a contract does not exist.
	#[error("Contract not found: {0}")]
	NotFound(String),
	/// Error that occurs when the signature image cannot be hosted.
	#[error("Asset error: {0}")]
	Asset(String),
	/// Error that occurs while persisting contracts.
	#[error("Storage error: {0}")]
	Storage(String),
}

impl From<woodcraft_storage::StorageError> for ContractError {
	fn from(err: woodcraft_storage::StorageError) -> Self {
		ContractError::Storage(err.to_string())
	}
}

impl From<woodcraft_quotation::QuotationError> for ContractError {
	fn from(err: woodcraft_quotation::QuotationError) -> Self {
		ContractError::Storage(err.to_string())
	}
}

impl From<AssetError> for ContractError {
	fn from(err: AssetError) -> Self {
		ContractError::Asset(err.to_string())
	}
}

/// Errors raised by asset host backends.
#[derive(Debug, Error)]
pub enum AssetError {
	/// The asset itself is unusable, e.g. an empty URL.
	#[error("Invalid asset: {0}")]
	InvalidAsset(String),
	/// The host rejected or failed the upload.
	#[error("{0}")]
	Upload(String),
	/// Error that occurs during configuration validation.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait implemented by signature image hosts.
#[async_trait]
pub trait AssetInterface: Send + Sync {
	/// Returns the configuration schema for this asset host.
	fn config_schema(&self) -> Box<dyn ConfigSchema>;

	/// Uploads base64 image data and returns the hosted URL.
	///
	/// `auth_token` is the caller's bearer token, forwarded when the host
	/// requires the acting user's credentials.
	async fn upload(
		&self,
		data: &str,
		auth_token: Option<&SecretString>,
	) -> Result<String, AssetError>;
}

/// Type alias for asset host factory functions.
pub type AssetFactory = fn(&toml::Value) -> Result<Box<dyn AssetInterface>, AssetError>;

/// Registry trait for asset host implementations.
pub trait AssetRegistry: ImplementationRegistry<Factory = AssetFactory> {}

/// Get all registered asset host implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AssetFactory)> {
	use implementations::{http, memory};

	vec![
		(http::Registry::NAME, http::Registry::factory()),
		(memory::Registry::NAME, memory::Registry::factory()),
	]
}

/// Turns signature assets into hosted URLs.
pub struct AssetService {
	backend: Box<dyn AssetInterface>,
}

impl AssetService {
	pub fn new(backend: Box<dyn AssetInterface>) -> Self {
		Self { backend }
	}

	/// Returns the URL of an already hosted asset, uploading inline data first.
	pub async fn resolve(
		&self,
		asset: &SignatureAsset,
		context: &RequestContext,
	) -> Result<String, AssetError> {
		match asset {
			SignatureAsset::Url(url) => {
				let url = url.trim();
				if url.is_empty() {
					return Err(AssetError::InvalidAsset("signature URL is empty".into()));
				}
				Ok(url.to_string())
			},
			SignatureAsset::Inline(data) => {
				if data.trim().is_empty() {
					return Err(AssetError::InvalidAsset("signature image is empty".into()));
				}
				self.backend
					.upload(data, context.auth_token.as_ref())
					.await
			},
		}
	}
}
