//! Main entry point for the woodcraft order service.
//!
//! Loads configuration, builds the order engine with the configured storage,
//! courier and asset host implementations, resumes interrupted transitions
//! and serves the HTTP API.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use woodcraft_config::Config;
use woodcraft_core::{EngineBuilder, EngineFactories, OrderEngine};

mod apis;
mod server;

use woodcraft_contract::implementations::http::create_asset_host as create_http_assets;
use woodcraft_contract::implementations::memory::create_asset_host as create_memory_assets;
use woodcraft_delivery::implementations::ghn::create_courier as create_ghn_courier;
use woodcraft_delivery::implementations::mock::create_courier as create_mock_courier;
use woodcraft_storage::implementations::file::create_storage as create_file_storage;
use woodcraft_storage::implementations::memory::create_storage as create_memory_storage;

/// Command-line arguments for the order service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config.toml", env = "WOODCRAFT_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,

	/// Skip resuming interrupted transitions at startup
	#[arg(long)]
	skip_recovery: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started woodcraft service");

	let config_path = args
		.config
		.to_str()
		.ok_or("configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let engine = Arc::new(build_engine(config.clone())?);

	if !args.skip_recovery {
		let report = engine.recovery().recover().await?;
		tracing::info!(
			scanned = report.scanned,
			resumed = report.resumed,
			skipped = report.skipped,
			"Startup recovery finished"
		);
	}

	match config.api {
		Some(api_config) if api_config.enabled => {
			server::start_server(api_config, engine).await?;
		},
		_ => tracing::warn!("API server disabled, nothing left to serve"),
	}

	tracing::info!("Stopped woodcraft service");
	Ok(())
}

/// Macro to create a factory HashMap with the appropriate type aliases
macro_rules! create_factory_map {
	($interface:path, $error:path, $( $name:literal => $factory:expr ),* $(,)?) => {{
		let mut factories = std::collections::HashMap::new();
		$(
			factories.insert(
				$name.to_string(),
				$factory as fn(&toml::Value) -> Result<Box<dyn $interface>, $error>
			);
		)*
		factories
	}};
}

/// Wires the concrete storage, courier and asset host implementations into
/// the engine.
fn build_engine(config: Config) -> Result<OrderEngine, Box<dyn std::error::Error>> {
	let builder = EngineBuilder::new(config);

	let storage_factories = create_factory_map!(
		woodcraft_storage::StorageInterface,
		woodcraft_storage::StorageError,
		"file" => create_file_storage,
		"memory" => create_memory_storage,
	);

	let courier_factories = create_factory_map!(
		woodcraft_delivery::CourierInterface,
		woodcraft_delivery::CourierError,
		"ghn" => create_ghn_courier,
		"mock" => create_mock_courier,
	);

	let asset_factories = create_factory_map!(
		woodcraft_contract::AssetInterface,
		woodcraft_contract::AssetError,
		"http" => create_http_assets,
		"memory" => create_memory_assets,
	);

	let factories = EngineFactories {
		storage_factories,
		courier_factories,
		asset_factories,
	};

	Ok(builder.build(factories)?)
}
