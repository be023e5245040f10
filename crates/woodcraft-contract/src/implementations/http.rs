//! HTTP asset host.
//!
//! Uploads base64 images as `{"image": "<base64>"}` and reads the hosted URL
//! from either `url` or `data.url` in the response.

use crate::{AssetError, AssetFactory, AssetInterface, AssetRegistry};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use woodcraft_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, SecretString, ValidationError,
};

const GENERIC_UPLOAD_ERROR: &str = "Failed to upload signature image";

pub struct HttpAssetHost {
	client: reqwest::Client,
	upload_url: String,
	api_key: Option<SecretString>,
}

impl HttpAssetHost {
	pub fn new(
		upload_url: String,
		api_key: Option<SecretString>,
		timeout: Duration,
	) -> Result<Self, AssetError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| AssetError::Configuration(e.to_string()))?;
		Ok(Self {
			client,
			upload_url,
			api_key,
		})
	}
}

/// Reads the hosted URL from an upload response.
fn extract_url(body: &Value) -> Option<String> {
	body.get("url")
		.or_else(|| body.get("data").and_then(|d| d.get("url")))
		.and_then(|v| v.as_str())
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

/// Backend error message, if the host sent one.
fn extract_message(body: &Value) -> Option<String> {
	body.get("message")
		.or_else(|| body.get("error").and_then(|e| e.get("message")))
		.and_then(|v| v.as_str())
		.filter(|s| !s.is_empty())
		.map(str::to_string)
}

#[async_trait]
impl AssetInterface for HttpAssetHost {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(HttpAssetSchema)
	}

	async fn upload(
		&self,
		data: &str,
		auth_token: Option<&SecretString>,
	) -> Result<String, AssetError> {
		let mut request = self
			.client
			.post(&self.upload_url)
			.json(&json!({ "image": data }));
		if let Some(token) = auth_token {
			request = request.bearer_auth(token.expose_secret());
		}
		if let Some(key) = &self.api_key {
			request = request.header("x-api-key", key.expose_secret());
		}

		let response = request.send().await.map_err(|e| {
			warn!(error = %e, "Signature upload request failed");
			AssetError::Upload(GENERIC_UPLOAD_ERROR.into())
		})?;
		let status = response.status();
		let body: Value = response.json().await.unwrap_or(Value::Null);

		if !status.is_success() {
			let message = extract_message(&body).unwrap_or_else(|| GENERIC_UPLOAD_ERROR.into());
			return Err(AssetError::Upload(message));
		}

		let url = extract_url(&body).ok_or_else(|| {
			AssetError::Upload(
				extract_message(&body).unwrap_or_else(|| GENERIC_UPLOAD_ERROR.into()),
			)
		})?;
		debug!(url = %url, "Uploaded signature image");
		Ok(url)
	}
}

pub struct HttpAssetSchema;

impl ConfigSchema for HttpAssetSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![Field::new("upload_url", FieldType::String).with_validator(|v| {
				match v.as_str() {
					Some(url) if url.starts_with("http://") || url.starts_with("https://") => {
						Ok(())
					},
					_ => Err("upload_url must be an http(s) URL".to_string()),
				}
			})],
			vec![
				Field::new("api_key", FieldType::String),
				Field::new(
					"timeout_seconds",
					FieldType::Integer {
						min: Some(1),
						max: Some(300),
					},
				),
			],
		);
		schema.validate(config)
	}
}

/// Factory function to create an HTTP asset host from configuration.
///
/// Configuration parameters:
/// - `upload_url`: endpoint accepting `{"image": base64}` (required)
/// - `api_key`: sent as `x-api-key` (optional)
/// - `timeout_seconds`: request timeout (default: 30)
pub fn create_asset_host(config: &toml::Value) -> Result<Box<dyn AssetInterface>, AssetError> {
	HttpAssetSchema
		.validate(config)
		.map_err(|e| AssetError::Configuration(e.to_string()))?;

	let upload_url = config
		.get("upload_url")
		.and_then(|v| v.as_str())
		.ok_or_else(|| AssetError::Configuration("upload_url is required".into()))?
		.to_string();
	let api_key = config
		.get("api_key")
		.and_then(|v| v.as_str())
		.map(SecretString::from);
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	Ok(Box::new(HttpAssetHost::new(
		upload_url,
		api_key,
		Duration::from_secs(timeout),
	)?))
}

/// Registry for the HTTP asset host.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "http";
	type Factory = AssetFactory;

	fn factory() -> Self::Factory {
		create_asset_host
	}
}

impl AssetRegistry for Registry {}
