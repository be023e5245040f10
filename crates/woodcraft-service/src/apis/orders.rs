//! Order endpoints: creation, lookups and lifecycle operations.
//!
//! Lifecycle operations share one route, `POST /api/orders/{id}/{operation}`,
//! and read their arguments from the JSON body.

use crate::apis::engine_error;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use woodcraft_core::OrderEngine;
use woodcraft_types::{
	APIError, ContractDraft, QuotationDetail, RequestContext, ShipmentDirection, ShipmentDraft,
	SignatureAsset,
};

#[derive(Debug, Deserialize)]
pub struct AddQuotationRequest {
	#[serde(default)]
	pub product_id: Option<String>,
	pub line: QuotationDetail,
}

#[derive(Debug, Deserialize)]
pub struct SetQuotationRequest {
	#[serde(default)]
	pub product_id: Option<String>,
	pub lines: Vec<QuotationDetail>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveQuotationRequest {
	#[serde(default)]
	pub product_id: Option<String>,
	pub line_id: String,
}

#[derive(Debug, Deserialize)]
pub struct SignatureRequest {
	pub signature: SignatureAsset,
}

#[derive(Debug, Deserialize)]
pub struct RegisterShipmentRequest {
	pub direction: ShipmentDirection,
	#[serde(flatten)]
	pub draft: ShipmentDraft,
}

#[derive(Debug, Deserialize)]
pub struct RecordDepositRequest {
	pub amount: u64,
	#[serde(default)]
	pub percent: u8,
}

#[derive(Debug, Deserialize)]
pub struct CancelRequest {
	pub reason: String,
}

fn parse<T: DeserializeOwned>(body: Value) -> Result<T, APIError> {
	serde_json::from_value(body).map_err(|e| APIError::BadRequest {
		error_type: "INVALID_REQUEST".into(),
		message: e.to_string(),
		details: None,
	})
}

fn to_json<T: Serialize>(value: T) -> Result<Value, APIError> {
	serde_json::to_value(value).map_err(|e| APIError::InternalServerError {
		message: format!("failed to serialize response: {}", e),
	})
}

/// Runs one lifecycle operation on an order.
pub async fn perform(
	engine: &OrderEngine,
	order_id: &str,
	operation: &str,
	body: Value,
	context: &RequestContext,
) -> Result<Value, APIError> {
	match operation {
		"begin-quoting" => to_json(
			engine
				.begin_quoting(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"add-quotation" => {
			let request: AddQuotationRequest = parse(body)?;
			to_json(
				engine
					.add_quotation(
						order_id,
						request.product_id.as_deref(),
						request.line,
						context,
					)
					.await
					.map_err(engine_error)?,
			)
		},
		"set-quotation" => {
			let request: SetQuotationRequest = parse(body)?;
			to_json(
				engine
					.set_quotation(
						order_id,
						request.product_id.as_deref(),
						request.lines,
						context,
					)
					.await
					.map_err(engine_error)?,
			)
		},
		"remove-quotation" => {
			let request: RemoveQuotationRequest = parse(body)?;
			engine
				.remove_quotation(
					order_id,
					request.product_id.as_deref(),
					&request.line_id,
					context,
				)
				.await
				.map_err(engine_error)?;
			Ok(serde_json::json!({ "removed": request.line_id }))
		},
		"submit-quotation" => to_json(
			engine
				.submit_quotation(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"draft-contract" => {
			let draft: ContractDraft = parse(body)?;
			to_json(
				engine
					.draft_contract(order_id, draft, context)
					.await
					.map_err(engine_error)?,
			)
		},
		"sign-woodworker" => {
			let request: SignatureRequest = parse(body)?;
			to_json(
				engine
					.sign_contract_as_woodworker(order_id, request.signature, context)
					.await
					.map_err(engine_error)?,
			)
		},
		"sign-customer" => {
			let request: SignatureRequest = parse(body)?;
			to_json(
				engine
					.sign_contract_as_customer(order_id, request.signature, context)
					.await
					.map_err(engine_error)?,
			)
		},
		"record-deposit" => {
			let request: RecordDepositRequest = parse(body)?;
			to_json(
				engine
					.record_deposit(order_id, request.amount, request.percent, context)
					.await
					.map_err(engine_error)?,
			)
		},
		"start-production" => to_json(
			engine
				.start_production(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"register-shipment" => {
			let request: RegisterShipmentRequest = parse(body)?;
			to_json(
				engine
					.register_shipment(order_id, request.direction, request.draft, context)
					.await
					.map_err(engine_error)?,
			)
		},
		"accept-free-guarantee" => to_json(
			engine
				.accept_free_guarantee(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"confirm-defective-received" => to_json(
			engine
				.confirm_defective_received(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"finish-and-ship" => to_json(
			engine
				.finish_and_ship(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"confirm-receipt" => to_json(
			engine
				.confirm_receipt(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"cancel" => {
			let request: CancelRequest = parse(body)?;
			to_json(
				engine
					.cancel(order_id, &request.reason, context)
					.await
					.map_err(engine_error)?,
			)
		},
		other => Err(APIError::NotFound {
			message: format!("unknown order operation '{}'", other),
		}),
	}
}

/// Reads one view of an order.
pub async fn view(
	engine: &OrderEngine,
	order_id: &str,
	view: &str,
	context: &RequestContext,
) -> Result<Value, APIError> {
	match view {
		"quotation" => to_json(
			engine
				.quotation_lines(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"contract" => to_json(
			engine
				.contract(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"contracts" => to_json(
			engine
				.contract_history(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"deposits" => to_json(
			engine
				.deposits(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"shipments" => to_json(
			engine
				.shipments(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		"journals" => to_json(
			engine
				.journals(order_id, context)
				.await
				.map_err(engine_error)?,
		),
		other => Err(APIError::NotFound {
			message: format!("unknown order view '{}'", other),
		}),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_register_shipment_body() {
		let request: RegisterShipmentRequest = parse(serde_json::json!({
			"direction": "Nhận",
			"from": { "name": "Nguyễn Văn B", "phone": "0900000002", "address": "34 Trần Hưng Đạo" },
			"to": { "name": "Xưởng Mộc An", "phone": "0900000001", "address": "12 Lê Lợi" },
			"to_ward_code": "20308",
			"to_district_id": 1444
		}))
		.unwrap();
		assert_eq!(request.direction, ShipmentDirection::Inbound);
		assert_eq!(request.draft.to_district_id, 1444);
	}

	#[test]
	fn test_record_deposit_body_defaults_percent() {
		let request: RecordDepositRequest =
			parse(serde_json::json!({ "amount": 200000 })).unwrap();
		assert_eq!(request.amount, 200_000);
		assert_eq!(request.percent, 0);
	}

	#[test]
	fn test_malformed_body_is_bad_request() {
		let result: Result<CancelRequest, _> = parse(serde_json::json!({ "why": "x" }));
		assert_eq!(result.unwrap_err().status_code(), 400);
	}
}
