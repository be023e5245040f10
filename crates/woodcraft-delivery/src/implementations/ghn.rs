//! GHN (Giao Hàng Nhanh) courier backend.
//!
//! Creates shipping orders through GHN's JSON API. Requests carry the shop
//! token and shop id as headers. A `message` returned by GHN is surfaced as
//! is; anything else becomes a generic failure.

use crate::{CourierError, CourierFactory, CourierInterface, CourierRegistry};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, warn};
use woodcraft_types::{
	ConfigSchema, CourierReceipt, CourierRequest, Field, FieldType, ImplementationRegistry,
	Schema, SecretString, ValidationError,
};

const DEFAULT_API_URL: &str = "https://online-gateway.ghn.vn/shiip/public-api";
const CREATE_ORDER_PATH: &str = "/v2/shipping-order/create";
const GENERIC_FAILURE: &str = "Failed to create courier shipment";

pub struct GhnCourier {
	client: reqwest::Client,
	api_url: String,
	token: SecretString,
	shop_id: i64,
}

#[derive(Debug, Deserialize)]
struct GhnResponse {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	data: Option<GhnOrderData>,
}

#[derive(Debug, Deserialize)]
struct GhnOrderData {
	order_code: String,
	#[serde(default)]
	total_fee: u64,
	#[serde(default)]
	expected_delivery_time: Option<String>,
}

impl GhnCourier {
	pub fn new(
		api_url: String,
		token: SecretString,
		shop_id: i64,
		timeout: Duration,
	) -> Result<Self, CourierError> {
		let client = reqwest::Client::builder()
			.timeout(timeout)
			.build()
			.map_err(|e| CourierError::Configuration(e.to_string()))?;
		Ok(Self {
			client,
			api_url: api_url.trim_end_matches('/').to_string(),
			token,
			shop_id,
		})
	}
}

/// GHN request body for a shipping order.
fn request_body(request: &CourierRequest) -> Value {
	json!({
		"client_order_code": request.client_order_code,
		"from_name": request.from.name,
		"from_phone": request.from.phone,
		"from_address": request.from.address,
		"to_name": request.to.name,
		"to_phone": request.to.phone,
		"to_address": request.to.address,
		"to_ward_code": request.to_ward_code,
		"to_district_id": request.to_district_id,
		"weight": request.weight,
		"length": request.length,
		"width": request.width,
		"height": request.height,
		"service_type_id": request.service_type_id,
		"payment_type_id": request.payment_type_id,
		"required_note": request.required_note,
		"items": request.items,
	})
}

/// Turns a GHN response into a receipt or the error message to surface.
fn parse_response(success: bool, body: Option<GhnResponse>) -> Result<CourierReceipt, CourierError> {
	let message = |body: &Option<GhnResponse>| {
		body.as_ref()
			.and_then(|b| b.message.clone())
			.filter(|m| !m.trim().is_empty())
			.unwrap_or_else(|| GENERIC_FAILURE.to_string())
	};

	if !success {
		return Err(CourierError::Rejected(message(&body)));
	}
	match body {
		Some(GhnResponse {
			data: Some(data), ..
		}) => Ok(CourierReceipt {
			order_code: data.order_code,
			total_fee: data.total_fee,
			expected_delivery_time: data.expected_delivery_time,
		}),
		other => Err(CourierError::Rejected(message(&other))),
	}
}

#[async_trait]
impl CourierInterface for GhnCourier {
	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(GhnCourierSchema)
	}

	async fn create_order(&self, request: &CourierRequest) -> Result<CourierReceipt, CourierError> {
		let url = format!("{}{}", self.api_url, CREATE_ORDER_PATH);
		let response = self
			.client
			.post(&url)
			.header("Token", self.token.expose_secret())
			.header("ShopId", self.shop_id.to_string())
			.json(&request_body(request))
			.send()
			.await
			.map_err(|e| {
				warn!(error = %e, "GHN request failed");
				CourierError::Network(GENERIC_FAILURE.to_string())
			})?;

		let status = response.status();
		let body = response.json::<GhnResponse>().await.ok();
		let receipt = parse_response(status.is_success(), body)?;
		debug!(
			client_order_code = %request.client_order_code,
			order_code = %receipt.order_code,
			"GHN shipping order created"
		);
		Ok(receipt)
	}
}

pub struct GhnCourierSchema;

impl ConfigSchema for GhnCourierSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![
				Field::new("token", FieldType::String).with_validator(|v| match v.as_str() {
					Some(token) if !token.trim().is_empty() => Ok(()),
					_ => Err("token cannot be empty".to_string()),
				}),
				Field::new(
					"shop_id",
					FieldType::Integer {
						min: Some(1),
						max: None,
					},
				),
			],
			vec![
				Field::new("api_url", FieldType::String),
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

/// Factory function to create a GHN courier from configuration.
///
/// Configuration parameters:
/// - `token`: GHN shop token (required)
/// - `shop_id`: GHN shop id (required)
/// - `api_url`: API base URL (default: GHN production gateway)
/// - `timeout_seconds`: request timeout (default: 30)
pub fn create_courier(config: &toml::Value) -> Result<Box<dyn CourierInterface>, CourierError> {
	GhnCourierSchema
		.validate(config)
		.map_err(|e| CourierError::Configuration(e.to_string()))?;

	let token = config
		.get("token")
		.and_then(|v| v.as_str())
		.map(SecretString::from)
		.ok_or_else(|| CourierError::Configuration("token is required".into()))?;
	let shop_id = config
		.get("shop_id")
		.and_then(|v| v.as_integer())
		.ok_or_else(|| CourierError::Configuration("shop_id is required".into()))?;
	let api_url = config
		.get("api_url")
		.and_then(|v| v.as_str())
		.unwrap_or(DEFAULT_API_URL)
		.to_string();
	let timeout = config
		.get("timeout_seconds")
		.and_then(|v| v.as_integer())
		.unwrap_or(30) as u64;

	Ok(Box::new(GhnCourier::new(
		api_url,
		token,
		shop_id,
		Duration::from_secs(timeout),
	)?))
}

/// Registry for the GHN courier.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "ghn";
	type Factory = CourierFactory;

	fn factory() -> Self::Factory {
		create_courier
	}
}

impl CourierRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;

	fn parse(json: &str) -> Option<GhnResponse> {
		serde_json::from_str(json).ok()
	}

	#[test]
	fn test_success_response() {
		let receipt = parse_response(
			true,
			parse(
				r#"{"code":200,"message":"Success","data":{"order_code":"GHN5ABC","total_fee":33000,"expected_delivery_time":"2026-11-22T23:59:59Z"}}"#,
			),
		)
		.unwrap();
		assert_eq!(receipt.order_code, "GHN5ABC");
		assert_eq!(receipt.total_fee, 33_000);
	}

	#[test]
	fn test_backend_message_is_verbatim() {
		let err = parse_response(
			false,
			parse(r#"{"code":400,"message":"Số điện thoại người nhận không hợp lệ"}"#),
		)
		.unwrap_err();
		assert_eq!(err.to_string(), "Số điện thoại người nhận không hợp lệ");
	}

	#[test]
	fn test_generic_fallback() {
		let err = parse_response(false, None).unwrap_err();
		assert_eq!(err.to_string(), GENERIC_FAILURE);

		let err = parse_response(true, parse(r#"{"code":200,"message":""}"#)).unwrap_err();
		assert_eq!(err.to_string(), GENERIC_FAILURE);
	}

	#[test]
	fn test_request_body_uses_ghn_field_names() {
		let request = CourierRequest {
			client_order_code: "o1-out".into(),
			from: Default::default(),
			to: woodcraft_types::ShipmentContact {
				name: "Chị Hoa".into(),
				phone: "0900000002".into(),
				address: "34 Trần Phú".into(),
			},
			to_ward_code: "20308".into(),
			to_district_id: 1444,
			weight: 2_000,
			length: 30,
			width: 20,
			height: 10,
			service_type_id: 2,
			payment_type_id: 1,
			required_note: "KHONGCHOXEMHANG".into(),
			items: vec![],
		};
		let body = request_body(&request);
		assert_eq!(body["to_name"], "Chị Hoa");
		assert_eq!(body["to_district_id"], 1444);
		assert_eq!(body["client_order_code"], "o1-out");
	}

	#[test]
	fn test_factory_requires_token_and_shop() {
		let config: toml::Value = toml::from_str("shop_id = 885").unwrap();
		assert!(matches!(
			create_courier(&config),
			Err(CourierError::Configuration(_))
		));

		let config: toml::Value = toml::from_str("token = \"abc\"\nshop_id = 885").unwrap();
		assert!(create_courier(&config).is_ok());
	}
}
