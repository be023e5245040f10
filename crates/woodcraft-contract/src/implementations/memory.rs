//! In-memory asset host.
//!
//! Keeps uploaded images in a map and hands out `memory://` URLs. Used in
//! tests and local development.

use crate::{AssetError, AssetFactory, AssetInterface, AssetRegistry};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use woodcraft_types::{
	ConfigSchema, ImplementationRegistry, Schema, SecretString, ValidationError,
};

pub struct MemoryAssetHost {
	assets: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryAssetHost {
	pub fn new() -> Self {
		Self {
			assets: Arc::new(RwLock::new(HashMap::new())),
		}
	}

	/// Returns the data uploaded under `url`.
	pub async fn get(&self, url: &str) -> Option<String> {
		self.assets.read().await.get(url).cloned()
	}
}

impl Default for MemoryAssetHost {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl AssetInterface for MemoryAssetHost {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(MemoryAssetSchema)
	}

	async fn upload(
		&self,
		data: &str,
		_auth_token: Option<&SecretString>,
	) -> Result<String, AssetError> {
		let url = format!("memory://assets/{}", uuid::Uuid::new_v4());
		self.assets
			.write()
			.await
			.insert(url.clone(), data.to_string());
		Ok(url)
	}
}

pub struct MemoryAssetSchema;

impl ConfigSchema for MemoryAssetSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], vec![]).validate(config)
	}
}

pub fn create_asset_host(_config: &toml::Value) -> Result<Box<dyn AssetInterface>, AssetError> {
	Ok(Box::new(MemoryAssetHost::new()))
}

/// Registry for the in-memory asset host.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "memory";
	type Factory = AssetFactory;

	fn factory() -> Self::Factory {
		create_asset_host
	}
}

impl AssetRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_upload_returns_retrievable_url() {
		let host = MemoryAssetHost::new();
		let url = host.upload("aGVsbG8=", None).await.unwrap();
		assert!(url.starts_with("memory://assets/"));
		assert_eq!(host.get(&url).await.as_deref(), Some("aGVsbG8="));
	}
}
