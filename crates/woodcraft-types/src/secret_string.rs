//! Secure string type for courier tokens and bearer credentials.
//!
//! `SecretString` zeroes its memory on drop and never prints its content in
//! logs or debug output.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::Zeroizing;

/// A string that is redacted in every printed or serialized form.
#[derive(Clone)]
pub struct SecretString(Zeroizing<String>);

impl SecretString {
	pub fn new(s: String) -> Self {
		Self(Zeroizing::new(s))
	}

	/// Exposes the secret string as a string slice.
	///
	/// Only use it where the raw value must leave the process, such as an
	/// outgoing HTTP header.
	pub fn expose_secret(&self) -> &str {
		&self.0
	}

	/// Exposes the secret to a closure, limiting the scope of the raw value.
	pub fn with_exposed<F, R>(&self, f: F) -> R
	where
		F: FnOnce(&str) -> R,
	{
		f(&self.0)
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl fmt::Debug for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "SecretString(***REDACTED***)")
	}
}

impl fmt::Display for SecretString {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "***REDACTED***")
	}
}

impl From<String> for SecretString {
	fn from(s: String) -> Self {
		Self::new(s)
	}
}

impl From<&str> for SecretString {
	fn from(s: &str) -> Self {
		Self::new(s.to_string())
	}
}

impl PartialEq for SecretString {
	fn eq(&self, other: &Self) -> bool {
		self.0.as_str() == other.0.as_str()
	}
}

impl Eq for SecretString {}

// Serialized forms are always redacted
impl Serialize for SecretString {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str("***REDACTED***")
	}
}

impl<'de> Deserialize<'de> for SecretString {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		Ok(SecretString::new(s))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_courier_token_is_redacted() {
		let token = SecretString::from("ghn-token-123");
		assert_eq!(format!("{:?}", token), "SecretString(***REDACTED***)");
		assert_eq!(format!("{}", token), "***REDACTED***");
		assert_eq!(
			serde_json::to_string(&token).unwrap(),
			"\"***REDACTED***\""
		);
		assert_eq!(token.expose_secret(), "ghn-token-123");
	}

	#[test]
	fn test_deserialize_keeps_value() {
		let token: SecretString = serde_json::from_str("\"bearer-abc\"").unwrap();
		assert_eq!(token.with_exposed(|s| s.len()), 10);
		assert_eq!(token, SecretString::from("bearer-abc"));
	}
}
