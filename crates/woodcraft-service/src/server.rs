//! HTTP server for the woodcraft order API.

use crate::apis::context::Actor;
use crate::apis::{engine_error, orders};
use axum::{
	body::Bytes,
	extract::{Path, State},
	http::{HeaderValue, StatusCode},
	response::Json,
	routing::{get, post},
	Router,
};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use woodcraft_config::{ApiConfig, CorsConfig};
use woodcraft_core::{OrderEngine, RecoveryReport};
use woodcraft_types::{APIError, Deposit, NewOrder, Order};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	pub engine: Arc<OrderEngine>,
}

fn cors_layer(cors: Option<&CorsConfig>) -> CorsLayer {
	if cors.is_some_and(|c| c.allowed_origins.iter().any(|o| o == "*")) {
		return CorsLayer::permissive();
	}
	let origins: Vec<HeaderValue> = cors
		.map(|c| {
			c.allowed_origins
				.iter()
				.filter_map(|origin| match origin.parse() {
					Ok(value) => Some(value),
					Err(_) => {
						tracing::warn!(%origin, "Ignoring invalid CORS origin");
						None
					},
				})
				.collect()
		})
		.unwrap_or_default();

	if origins.is_empty() {
		CorsLayer::permissive()
	} else {
		CorsLayer::new()
			.allow_origin(origins)
			.allow_methods(Any)
			.allow_headers(Any)
	}
}

/// Builds the API router.
pub fn router(engine: Arc<OrderEngine>) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/health", get(handle_health))
				.route("/orders", post(handle_create_order))
				.route("/orders/{id}", get(handle_get_order))
				.route(
					"/orders/{id}/{operation}",
					get(handle_order_view).post(handle_order_operation),
				)
				.route("/deposits/{id}/pay", post(handle_pay_deposit))
				.route("/recovery", post(handle_recovery)),
		)
		.with_state(AppState { engine })
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	engine: Arc<OrderEngine>,
) -> Result<(), Box<dyn std::error::Error>> {
	let app = router(engine).layer(
		ServiceBuilder::new()
			.layer(TraceLayer::new_for_http())
			.layer(TimeoutLayer::new(Duration::from_secs(
				api_config.timeout_seconds,
			)))
			.layer(cors_layer(api_config.cors.as_ref())),
	);

	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Woodcraft API server starting on {}", bind_address);

	axum::serve(listener, app).await?;

	Ok(())
}

fn json_body(body: &Bytes) -> Result<Value, APIError> {
	if body.iter().all(u8::is_ascii_whitespace) {
		return Ok(Value::Null);
	}
	serde_json::from_slice(body).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_JSON".into(),
		message: e.to_string(),
		details: None,
	})
}

async fn handle_health() -> Json<Value> {
	Json(serde_json::json!({ "status": "ok" }))
}

/// Handles POST /api/orders requests.
async fn handle_create_order(
	State(state): State<AppState>,
	Actor(context): Actor,
	Json(request): Json<NewOrder>,
) -> Result<(StatusCode, Json<Order>), APIError> {
	match state.engine.create_order(request, &context).await {
		Ok(order) => Ok((StatusCode::CREATED, Json(order))),
		Err(e) => {
			tracing::warn!("Order creation failed: {}", e);
			Err(engine_error(e))
		},
	}
}

/// Handles GET /api/orders/{id} requests.
async fn handle_get_order(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Actor(context): Actor,
) -> Result<Json<Order>, APIError> {
	state
		.engine
		.get_order(&id, &context)
		.await
		.map(Json)
		.map_err(engine_error)
}

/// Handles GET /api/orders/{id}/{view} requests.
async fn handle_order_view(
	Path((id, view)): Path<(String, String)>,
	State(state): State<AppState>,
	Actor(context): Actor,
) -> Result<Json<Value>, APIError> {
	orders::view(&state.engine, &id, &view, &context)
		.await
		.map(Json)
}

/// Handles POST /api/orders/{id}/{operation} requests.
async fn handle_order_operation(
	Path((id, operation)): Path<(String, String)>,
	State(state): State<AppState>,
	Actor(context): Actor,
	body: Bytes,
) -> Result<Json<Value>, APIError> {
	let body = json_body(&body)?;
	match orders::perform(&state.engine, &id, &operation, body, &context).await {
		Ok(value) => Ok(Json(value)),
		Err(e) => {
			tracing::warn!(order_id = %id, %operation, "Order operation failed: {}", e);
			Err(e)
		},
	}
}

/// Handles POST /api/deposits/{id}/pay requests.
async fn handle_pay_deposit(
	Path(id): Path<String>,
	State(state): State<AppState>,
	Actor(context): Actor,
) -> Result<Json<Deposit>, APIError> {
	state
		.engine
		.pay_deposit(&id, &context)
		.await
		.map(Json)
		.map_err(engine_error)
}

/// Handles POST /api/recovery requests. Admin only.
async fn handle_recovery(
	State(state): State<AppState>,
	Actor(context): Actor,
) -> Result<Json<RecoveryReport>, APIError> {
	if !context.is_admin() {
		return Err(APIError::Forbidden {
			message: "recovery is restricted to admins".into(),
		});
	}
	let report = state
		.engine
		.recovery()
		.recover()
		.await
		.map_err(engine_error)?;
	Ok(Json(report))
}

#[cfg(test)]
mod tests {
	use super::*;
	use axum::body::Body;
	use axum::http::Request;
	use tower::ServiceExt;
	use woodcraft_contract::implementations::memory::MemoryAssetHost;
	use woodcraft_contract::AssetService;
	use woodcraft_core::EngineSettings;
	use woodcraft_delivery::implementations::mock::MockCourier;
	use woodcraft_storage::implementations::memory::MemoryStorage;
	use woodcraft_storage::StorageService;

	fn app() -> Router {
		let engine = OrderEngine::new(
			Arc::new(StorageService::new(Box::new(MemoryStorage::new()))),
			Arc::new(MockCourier::new()),
			Arc::new(AssetService::new(Box::new(MemoryAssetHost::new()))),
			EngineSettings::default(),
		);
		router(Arc::new(engine))
	}

	fn request(method: &str, uri: &str, actor: Option<(&str, &str)>, body: Value) -> Request<Body> {
		let mut builder = Request::builder()
			.method(method)
			.uri(uri)
			.header("content-type", "application/json");
		if let Some((id, role)) = actor {
			builder = builder
				.header("x-actor-id", id)
				.header("x-actor-role", role);
		}
		let body = if body.is_null() {
			Body::empty()
		} else {
			Body::from(body.to_string())
		};
		builder.body(body).unwrap()
	}

	async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
		let response = app.clone().oneshot(request).await.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let body = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, body)
	}

	fn new_order() -> Value {
		serde_json::json!({
			"kind": "service",
			"requested_products": [
				{ "product_id": "p1", "name": "Bàn ăn", "quantity": 1 },
				{ "product_id": "p2", "name": "Ghế", "quantity": 4 }
			],
			"woodworker_id": "ww-1",
			"ship_fee": 30000
		})
	}

	#[tokio::test]
	async fn test_health() {
		let (status, body) = send(&app(), request("GET", "/api/health", None, Value::Null)).await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "ok");
	}

	#[tokio::test]
	async fn test_order_lifecycle_over_http() {
		let app = app();
		let customer = Some(("cus-1", "customer"));
		let woodworker = Some(("ww-1", "woodworker"));

		let (status, _) = send(&app, request("POST", "/api/orders", None, new_order())).await;
		assert_eq!(status, StatusCode::BAD_REQUEST);

		let (status, order) = send(&app, request("POST", "/api/orders", customer, new_order())).await;
		assert_eq!(status, StatusCode::CREATED);
		assert_eq!(order["status"], "requested");
		let id = order["id"].as_str().unwrap().to_string();

		let (status, body) = send(
			&app,
			request("GET", &format!("/api/orders/{}", id), Some(("cus-2", "customer")), Value::Null),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);
		assert_eq!(body["error"], "FORBIDDEN");

		let (status, order) = send(
			&app,
			request("POST", &format!("/api/orders/{}/begin-quoting", id), woodworker, Value::Null),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(order["status"], "quoting");

		let (status, body) = send(
			&app,
			request(
				"POST",
				&format!("/api/orders/{}/set-quotation", id),
				woodworker,
				serde_json::json!({
					"product_id": "p1",
					"lines": [
						{ "cost_type": "Gỗ", "quantity_required": "2", "cost_amount": 500000 },
						{ "cost_type": "Sơn", "quantity_required": "1", "cost_amount": 999 }
					]
				}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::BAD_REQUEST);
		assert_eq!(body["error"], "VALIDATION_ERROR");

		let (status, body) = send(
			&app,
			request(
				"POST",
				&format!("/api/orders/{}/draft-contract", id),
				woodworker,
				serde_json::json!({
					"woodworker_terms": "Gỗ sồi",
					"complete_date": "2026-11-19T20:00:00Z",
					"warranties": [
						{ "product_id": "p1", "months": 12 },
						{ "product_id": "p2", "months": 12 }
					]
				}),
			),
		)
		.await;
		assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
		assert_eq!(body["error"], "PRECONDITION_FAILED");

		let (status, _) = send(
			&app,
			request("POST", &format!("/api/orders/{}/teleport", id), woodworker, Value::Null),
		)
		.await;
		assert_eq!(status, StatusCode::NOT_FOUND);

		let (status, body) = send(
			&app,
			request(
				"POST",
				&format!("/api/orders/{}/cancel", id),
				customer,
				serde_json::json!({ "reason": "đổi ý" }),
			),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["status"], "cancelled");

		let (status, body) = send(
			&app,
			request(
				"POST",
				&format!("/api/orders/{}/begin-quoting", id),
				woodworker,
				Value::Null,
			),
		)
		.await;
		assert_eq!(status, StatusCode::CONFLICT);
		assert_eq!(body["error"], "INVALID_TRANSITION");
	}

	#[tokio::test]
	async fn test_recovery_is_admin_only() {
		let app = app();
		let (status, _) = send(
			&app,
			request("POST", "/api/recovery", Some(("cus-1", "customer")), Value::Null),
		)
		.await;
		assert_eq!(status, StatusCode::FORBIDDEN);

		let (status, body) = send(
			&app,
			request("POST", "/api/recovery", Some(("ops", "admin")), Value::Null),
		)
		.await;
		assert_eq!(status, StatusCode::OK);
		assert_eq!(body["scanned"], 0);
	}
}
