//! API error types for the HTTP surface.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Error body returned by every failing endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Error type/code
	pub error: String,
	/// Human-readable description
	pub message: String,
	/// Additional error context, e.g. per-line validation messages
	#[serde(skip_serializing_if = "Option::is_none")]
	pub details: Option<serde_json::Value>,
}

/// Structured API error type with HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Malformed request or failed validation (400)
	BadRequest {
		error_type: String,
		message: String,
		details: Option<serde_json::Value>,
	},
	/// Caller is not a party allowed to act on the order (403)
	Forbidden { message: String },
	/// Unknown order, contract or deposit (404)
	NotFound { message: String },
	/// Illegal transition or concurrent transition attempt (409)
	Conflict { error_type: String, message: String },
	/// Business precondition not met (422)
	UnprocessableEntity { error_type: String, message: String },
	/// Courier or asset host failure (502)
	BadGateway { error_type: String, message: String },
	/// Internal server error (500)
	InternalServerError { message: String },
}

impl APIError {
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::Forbidden { .. } => 403,
			APIError::NotFound { .. } => 404,
			APIError::Conflict { .. } => 409,
			APIError::UnprocessableEntity { .. } => 422,
			APIError::BadGateway { .. } => 502,
			APIError::InternalServerError { .. } => 500,
		}
	}

	pub fn to_error_response(&self) -> ErrorResponse {
		let (error, message, details) = match self {
			APIError::BadRequest {
				error_type,
				message,
				details,
			} => (error_type.as_str(), message, details.clone()),
			APIError::Forbidden { message } => ("FORBIDDEN", message, None),
			APIError::NotFound { message } => ("NOT_FOUND", message, None),
			APIError::Conflict {
				error_type,
				message,
			}
			| APIError::UnprocessableEntity {
				error_type,
				message,
			}
			| APIError::BadGateway {
				error_type,
				message,
			} => (error_type.as_str(), message, None),
			APIError::InternalServerError { message } => ("INTERNAL_ERROR", message, None),
		};
		ErrorResponse {
			error: error.to_string(),
			message: message.clone(),
			details,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let body = self.to_error_response();
		write!(f, "{} ({}): {}", body.error, self.status_code(), body.message)
	}
}

impl std::error::Error for APIError {}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status = StatusCode::from_u16(self.status_code())
			.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
		(status, Json(self.to_error_response())).into_response()
	}
}
