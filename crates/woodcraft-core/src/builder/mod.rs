//! Builder for constructing order engines.
//!
//! Composes an [`OrderEngine`] from configuration and factory functions for
//! each pluggable backend: storage, courier and signature asset host.

use crate::engine::{EngineSettings, OrderEngine};
use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use woodcraft_config::Config;
use woodcraft_contract::{AssetError, AssetInterface, AssetService};
use woodcraft_delivery::{CourierError, CourierInterface, PackageSettings};
use woodcraft_storage::{StorageError, StorageInterface, StorageService};

/// Errors that can occur during engine construction.
#[derive(Debug, Error)]
pub enum BuilderError {
	#[error("Configuration error: {0}")]
	Config(String),
	#[error("Missing required component: {0}")]
	MissingComponent(String),
}

/// Factory functions for every backend the engine needs, keyed by
/// implementation name.
pub struct EngineFactories<SF, CF, AF> {
	pub storage_factories: HashMap<String, SF>,
	pub courier_factories: HashMap<String, CF>,
	pub asset_factories: HashMap<String, AF>,
}

/// Creates every configured implementation of one component and returns
/// the primary one.
fn create_primary<T, E, F>(
	component: &str,
	primary: &str,
	implementations: &HashMap<String, toml::Value>,
	factories: &HashMap<String, F>,
) -> Result<T, BuilderError>
where
	E: Display,
	F: Fn(&toml::Value) -> Result<T, E>,
{
	let mut loaded = HashMap::new();
	for (name, config) in implementations {
		let Some(factory) = factories.get(name) else {
			tracing::warn!(component, implementation = %name, "No factory registered, ignoring");
			continue;
		};
		match factory(config) {
			Ok(implementation) => {
				let is_primary = primary == name;
				tracing::info!(component, implementation = %name, enabled = %is_primary, "Loaded");
				loaded.insert(name.clone(), implementation);
			},
			Err(e) => {
				tracing::error!(
					component,
					implementation = %name,
					error = %e,
					"Failed to create implementation"
				);
				return Err(BuilderError::Config(format!(
					"Failed to create {} implementation '{}': {}",
					component, name, e
				)));
			},
		}
	}

	if loaded.is_empty() {
		return Err(BuilderError::MissingComponent(format!(
			"no valid {} implementations available",
			component
		)));
	}

	loaded.remove(primary).ok_or_else(|| {
		BuilderError::Config(format!(
			"Primary {} '{}' failed to load or has invalid configuration",
			component, primary
		))
	})
}

/// Builder for constructing an OrderEngine with pluggable implementations.
pub struct EngineBuilder {
	config: Config,
}

impl EngineBuilder {
	pub fn new(config: Config) -> Self {
		Self { config }
	}

	/// Engine settings derived from the configuration.
	pub fn settings(&self) -> Result<EngineSettings, BuilderError> {
		let shipment = &self.config.shipment;
		Ok(EngineSettings {
			contract_offset: self
				.config
				.contract
				.offset()
				.map_err(|e| BuilderError::Config(e.to_string()))?,
			deposit_schedule: self.config.payment.deposit_schedule.clone(),
			package: PackageSettings {
				default_dimension_cm: shipment.default_dimension_cm,
				default_weight_grams: shipment.default_weight_grams,
				service_type_id: shipment.service_type_id,
				payment_type_id: shipment.payment_type_id,
				required_note: shipment.required_note.clone(),
			},
			..EngineSettings::default()
		})
	}

	/// Builds the OrderEngine using factories for each component type.
	pub fn build<SF, CF, AF>(
		self,
		factories: EngineFactories<SF, CF, AF>,
	) -> Result<OrderEngine, BuilderError>
	where
		SF: Fn(&toml::Value) -> Result<Box<dyn StorageInterface>, StorageError>,
		CF: Fn(&toml::Value) -> Result<Box<dyn CourierInterface>, CourierError>,
		AF: Fn(&toml::Value) -> Result<Box<dyn AssetInterface>, AssetError>,
	{
		let settings = self.settings()?;

		let storage_backend = create_primary(
			"storage",
			&self.config.storage.primary,
			&self.config.storage.implementations,
			&factories.storage_factories,
		)?;
		let storage = Arc::new(StorageService::new(storage_backend));

		let courier: Arc<dyn CourierInterface> = Arc::from(create_primary(
			"courier",
			&self.config.courier.primary,
			&self.config.courier.implementations,
			&factories.courier_factories,
		)?);

		let asset_backend = create_primary(
			"assets",
			&self.config.assets.primary,
			&self.config.assets.implementations,
			&factories.asset_factories,
		)?;
		let assets = Arc::new(AssetService::new(asset_backend));

		tracing::info!(service_id = %self.config.service.id, "Order engine built");
		Ok(OrderEngine::new(storage, courier, assets, settings))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const CONFIG: &str = r#"
[service]
id = "woodcraft-builder-test"

[storage]
primary = "memory"
[storage.implementations.memory]

[courier]
primary = "mock"
[courier.implementations.mock]

[assets]
primary = "memory"
[assets.implementations.memory]

[payment]
deposit_schedule = [50, 50]
"#;

	fn factories() -> EngineFactories<
		woodcraft_storage::StorageFactory,
		woodcraft_delivery::CourierFactory,
		woodcraft_contract::AssetFactory,
	> {
		EngineFactories {
			storage_factories: woodcraft_storage::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			courier_factories: woodcraft_delivery::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
			asset_factories: woodcraft_contract::get_all_implementations()
				.into_iter()
				.map(|(name, f)| (name.to_string(), f))
				.collect(),
		}
	}

	#[test]
	fn test_settings_follow_config() {
		let config: Config = CONFIG.parse().unwrap();
		let settings = EngineBuilder::new(config).settings().unwrap();
		assert_eq!(settings.deposit_schedule, vec![50, 50]);
		assert_eq!(settings.contract_offset.local_minus_utc(), 7 * 3600);
		assert_eq!(settings.package.required_note, "KHONGCHOXEMHANG");
	}

	#[test]
	fn test_build_with_registered_factories() {
		let config: Config = CONFIG.parse().unwrap();
		assert!(EngineBuilder::new(config).build(factories()).is_ok());
	}

	#[test]
	fn test_build_fails_without_primary_factory() {
		let config: Config = CONFIG.parse().unwrap();
		let mut factories = factories();
		factories.courier_factories.clear();
		assert!(matches!(
			EngineBuilder::new(config).build(factories),
			Err(BuilderError::MissingComponent(_))
		));
	}
}
