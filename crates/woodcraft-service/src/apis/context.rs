//! Extraction of the acting party from request headers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use woodcraft_types::{APIError, RequestContext, Role, SecretString};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";

/// The caller of a request, built from `x-actor-id`, `x-actor-role` and an
/// optional `authorization: Bearer` token forwarded to the asset host.
pub struct Actor(pub RequestContext);

fn header<'a>(parts: &'a Parts, name: &str) -> Option<&'a str> {
	parts
		.headers
		.get(name)
		.and_then(|v| v.to_str().ok())
		.map(str::trim)
		.filter(|v| !v.is_empty())
}

fn bad_request(message: String) -> APIError {
	APIError::BadRequest {
		error_type: "INVALID_ACTOR".into(),
		message,
		details: None,
	}
}

impl<S> FromRequestParts<S> for Actor
where
	S: Send + Sync,
{
	type Rejection = APIError;

	async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
		let actor_id = header(parts, ACTOR_ID_HEADER)
			.ok_or_else(|| bad_request(format!("{} header is required", ACTOR_ID_HEADER)))?
			.to_string();
		let role: Role = header(parts, ACTOR_ROLE_HEADER)
			.ok_or_else(|| bad_request(format!("{} header is required", ACTOR_ROLE_HEADER)))?
			.parse()
			.map_err(bad_request)?;

		let mut context = RequestContext::new(actor_id, role);
		if let Some(token) = header(parts, "authorization").and_then(|v| v.strip_prefix("Bearer ")) {
			context = context.with_token(SecretString::from(token.trim()));
		}
		Ok(Actor(context))
	}
}
