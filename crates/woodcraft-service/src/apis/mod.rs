//! Request handling shared by the HTTP endpoints.

pub mod context;
pub mod orders;

use woodcraft_core::{EngineError, SHIPMENT_RETRY_GUIDANCE};
use woodcraft_types::APIError;

/// Maps an engine error onto its HTTP representation.
pub fn engine_error(err: EngineError) -> APIError {
	match err {
		EngineError::Validation(errors) => APIError::BadRequest {
			error_type: "VALIDATION_ERROR".into(),
			message: errors.join("; "),
			details: Some(serde_json::json!(errors)),
		},
		EngineError::PreconditionFailed(message) => APIError::UnprocessableEntity {
			error_type: "PRECONDITION_FAILED".into(),
			message,
		},
		EngineError::ShipmentCreationFailed(message) => APIError::UnprocessableEntity {
			error_type: "SHIPMENT_CREATION_FAILED".into(),
			message: format!("{}; {}", message, SHIPMENT_RETRY_GUIDANCE),
		},
		EngineError::RemoteService(message) => APIError::BadGateway {
			error_type: "REMOTE_SERVICE_ERROR".into(),
			message,
		},
		e @ EngineError::InvalidTransition { .. } => APIError::Conflict {
			error_type: "INVALID_TRANSITION".into(),
			message: e.to_string(),
		},
		EngineError::NotFound(message) => APIError::NotFound { message },
		EngineError::Forbidden(message) => APIError::Forbidden { message },
		EngineError::Conflict(message) => APIError::Conflict {
			error_type: "CONFLICT".into(),
			message,
		},
		EngineError::Storage(message) => {
			tracing::error!(error = %message, "Storage failure");
			APIError::InternalServerError {
				message: "internal storage error".into(),
			}
		},
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use woodcraft_types::OrderStatus;

	#[test]
	fn test_status_codes() {
		let cases = vec![
			(EngineError::Validation(vec!["line 1: bad".into()]), 400),
			(EngineError::Forbidden("no".into()), 403),
			(EngineError::NotFound("order x".into()), 404),
			(
				EngineError::InvalidTransition {
					from: OrderStatus::Completed,
					to: OrderStatus::Cancelled,
				},
				409,
			),
			(EngineError::Conflict("busy".into()), 409),
			(EngineError::PreconditionFailed("unquoted".into()), 422),
			(EngineError::ShipmentCreationFailed("rejected".into()), 422),
			(EngineError::RemoteService("upload failed".into()), 502),
			(EngineError::Storage("disk".into()), 500),
		];
		for (err, status) in cases {
			assert_eq!(engine_error(err).status_code(), status);
		}
	}

	#[test]
	fn test_validation_details_list_every_message() {
		let body = engine_error(EngineError::Validation(vec![
			"line 1: bad".into(),
			"line 2: bad".into(),
		]))
		.to_error_response();
		assert_eq!(body.error, "VALIDATION_ERROR");
		assert_eq!(
			body.details,
			Some(serde_json::json!(["line 1: bad", "line 2: bad"]))
		);
	}

	#[test]
	fn test_shipment_failure_carries_retry_guidance() {
		let body = engine_error(EngineError::ShipmentCreationFailed(
			"Địa chỉ không hợp lệ".into(),
		))
		.to_error_response();
		assert_eq!(body.error, "SHIPMENT_CREATION_FAILED");
		assert_eq!(
			body.message,
			"Địa chỉ không hợp lệ; retry the whole action once the cause is fixed"
		);
	}
}
