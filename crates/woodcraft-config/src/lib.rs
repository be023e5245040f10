//! Configuration module for the woodcraft order orchestrator.
//!
//! This module provides structures and utilities for managing orchestrator
//! configuration. It supports loading configuration from TOML files and
//! validates that all required values are properly set.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["file1.toml", "file2.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use chrono::FixedOffset;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

pub use loader::ConfigLoader;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message, not the full input dump
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the orchestrator.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this orchestrator instance.
	pub service: ServiceConfig,
	/// Configuration for the storage backend.
	pub storage: StorageConfig,
	/// Configuration for the courier backends.
	pub courier: CourierConfig,
	/// Configuration for the signature image host.
	pub assets: AssetsConfig,
	/// Contract drafting settings.
	#[serde(default)]
	pub contract: ContractConfig,
	/// Deposit schedule settings.
	#[serde(default)]
	pub payment: PaymentConfig,
	/// Package defaults used when building courier requests.
	#[serde(default)]
	pub shipment: ShipmentConfig,
	/// HTTP API server configuration.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the orchestrator instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Unique identifier for this instance.
	pub id: String,
}

/// Configuration for the storage backend.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
	/// Which implementation to use as primary.
	pub primary: String,
	/// Map of storage backend implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for courier backends.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CourierConfig {
	/// Which implementation creates shipments.
	pub primary: String,
	/// Map of courier implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Configuration for the signature image host.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AssetsConfig {
	/// Which implementation uploads inline signatures.
	pub primary: String,
	/// Map of asset host implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Contract drafting settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ContractConfig {
	/// Fixed UTC offset used to normalize completion dates, e.g. `+07:00`.
	#[serde(default = "default_timezone")]
	pub timezone: String,
}

impl Default for ContractConfig {
	fn default() -> Self {
		Self {
			timezone: default_timezone(),
		}
	}
}

impl ContractConfig {
	/// Parses the configured offset.
	pub fn offset(&self) -> Result<FixedOffset, ConfigError> {
		self.timezone.parse::<FixedOffset>().map_err(|e| {
			ConfigError::Validation(format!(
				"Invalid contract timezone '{}': {}",
				self.timezone, e
			))
		})
	}
}

/// Deposit schedule settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PaymentConfig {
	/// Installment percents scheduled when a contract is signed. Empty means
	/// the woodworker records each deposit by hand.
	#[serde(default = "default_deposit_schedule")]
	pub deposit_schedule: Vec<u8>,
}

impl Default for PaymentConfig {
	fn default() -> Self {
		Self {
			deposit_schedule: default_deposit_schedule(),
		}
	}
}

/// Package defaults for courier requests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ShipmentConfig {
	/// Length, width or height used when a product spec does not parse.
	#[serde(default = "default_dimension_cm")]
	pub default_dimension_cm: u32,
	/// Weight used when a product carries no weight.
	#[serde(default = "default_weight_grams")]
	pub default_weight_grams: u32,
	/// Courier service type.
	#[serde(default = "default_service_type_id")]
	pub service_type_id: u32,
	/// Who pays the courier fee.
	#[serde(default = "default_payment_type_id")]
	pub payment_type_id: u32,
	/// Delivery note required by the courier.
	#[serde(default = "default_required_note")]
	pub required_note: String,
}

impl Default for ShipmentConfig {
	fn default() -> Self {
		Self {
			default_dimension_cm: default_dimension_cm(),
			default_weight_grams: default_weight_grams(),
			service_type_id: default_service_type_id(),
			payment_type_id: default_payment_type_id(),
			required_note: default_required_note(),
		}
	}
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
	/// Request timeout in seconds.
	#[serde(default = "default_api_timeout")]
	pub timeout_seconds: u64,
	/// CORS configuration.
	pub cors: Option<CorsConfig>,
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CorsConfig {
	/// Allowed origins for CORS. `*` allows any origin.
	pub allowed_origins: Vec<String>,
}

fn default_timezone() -> String {
	"+07:00".to_string()
}

fn default_deposit_schedule() -> Vec<u8> {
	vec![30, 70]
}

fn default_dimension_cm() -> u32 {
	20
}

fn default_weight_grams() -> u32 {
	1_000
}

fn default_service_type_id() -> u32 {
	2
}

fn default_payment_type_id() -> u32 {
	1
}

fn default_required_note() -> String {
	"KHONGCHOXEMHANG".to_string()
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3000
}

fn default_api_timeout() -> u64 {
	30
}

/// Resolves `${VAR}` and `${VAR:-default}` references against the environment.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;
	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};
		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf.parent().unwrap_or_else(|| Path::new("."));

		let mut loader = ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Validates the configuration:
	/// - service id is not empty
	/// - each primary names a configured implementation
	/// - the contract timezone parses
	/// - a non-empty deposit schedule sums to 100
	/// - package defaults are positive
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		validate_primary("storage", &self.storage.primary, &self.storage.implementations)?;
		validate_primary("courier", &self.courier.primary, &self.courier.implementations)?;
		validate_primary("assets", &self.assets.primary, &self.assets.implementations)?;

		self.contract.offset()?;

		let schedule = &self.payment.deposit_schedule;
		if schedule.iter().any(|p| *p == 0 || *p > 100) {
			return Err(ConfigError::Validation(
				"Deposit schedule percents must be between 1 and 100".into(),
			));
		}
		let sum: u32 = schedule.iter().map(|p| u32::from(*p)).sum();
		if !schedule.is_empty() && sum != 100 {
			return Err(ConfigError::Validation(format!(
				"Deposit schedule must sum to 100, got {}",
				sum
			)));
		}

		if self.shipment.default_dimension_cm == 0 || self.shipment.default_weight_grams == 0 {
			return Err(ConfigError::Validation(
				"Shipment default dimension and weight must be positive".into(),
			));
		}

		if let Some(api) = &self.api {
			if api.enabled && api.timeout_seconds == 0 {
				return Err(ConfigError::Validation(
					"API timeout_seconds must be positive".into(),
				));
			}
		}

		Ok(())
	}
}

fn validate_primary(
	section: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
) -> Result<(), ConfigError> {
	if implementations.is_empty() {
		return Err(ConfigError::Validation(format!(
			"At least one {} implementation must be configured",
			section
		)));
	}
	if primary.is_empty() {
		return Err(ConfigError::Validation(format!(
			"{} primary implementation cannot be empty",
			section
		)));
	}
	if !implementations.contains_key(primary) {
		return Err(ConfigError::Validation(format!(
			"Primary {} '{}' not found in implementations. Available: {:?}",
			section,
			primary,
			implementations.keys().collect::<Vec<_>>()
		)));
	}
	Ok(())
}

impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let resolved = resolve_env_vars(s)?;
		let config: Config = toml::from_str(&resolved)?;
		config.validate()?;
		Ok(config)
	}
}
