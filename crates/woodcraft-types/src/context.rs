//! Request context passed explicitly into every orchestrator call.
//!
//! The acting party and its credentials travel with the call instead of
//! being read from ambient storage, which keeps the state machine testable.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::SecretString;

/// Role of the acting party.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Role {
	Customer,
	Woodworker,
	Admin,
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Role::Customer => write!(f, "customer"),
			Role::Woodworker => write!(f, "woodworker"),
			Role::Admin => write!(f, "admin"),
		}
	}
}

impl std::str::FromStr for Role {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"customer" => Ok(Role::Customer),
			"woodworker" => Ok(Role::Woodworker),
			"admin" => Ok(Role::Admin),
			other => Err(format!("unknown role '{}'", other)),
		}
	}
}

/// Who is calling and with which credentials.
#[derive(Debug, Clone)]
pub struct RequestContext {
	pub actor_id: String,
	pub role: Role,
	/// Bearer token forwarded to collaborators that need it (asset host).
	pub auth_token: Option<SecretString>,
}

impl RequestContext {
	pub fn new(actor_id: impl Into<String>, role: Role) -> Self {
		Self {
			actor_id: actor_id.into(),
			role,
			auth_token: None,
		}
	}

	pub fn customer(actor_id: impl Into<String>) -> Self {
		Self::new(actor_id, Role::Customer)
	}

	pub fn woodworker(actor_id: impl Into<String>) -> Self {
		Self::new(actor_id, Role::Woodworker)
	}

	pub fn admin(actor_id: impl Into<String>) -> Self {
		Self::new(actor_id, Role::Admin)
	}

	pub fn with_token(mut self, token: SecretString) -> Self {
		self.auth_token = Some(token);
		self
	}

	pub fn is_admin(&self) -> bool {
		self.role == Role::Admin
	}
}
