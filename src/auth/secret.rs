//! Redacting wrapper for client secrets, tokens, and verifiers.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

/// Secret string that never leaks through `Debug`/`Display`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Compares against `candidate` in constant time.
	pub fn matches(&self, candidate: &str) -> bool {
		constant_time_eq(&self.0, candidate)
	}
}
impl PartialEq for Secret {
	fn eq(&self, other: &Self) -> bool {
		self.matches(&other.0)
	}
}
impl Eq for Secret {}
impl AsRef<str> for Secret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl From<&str> for Secret {
	fn from(value: &str) -> Self {
		Self::new(value)
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("Secret").field(&"<redacted>").finish()
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Unpadded base64url encoding of `len` random bytes from the thread-local CSPRNG.
pub fn random_urlsafe(len: usize) -> String {
	let mut bytes = vec![0_u8; len];

	rand::rng().fill_bytes(&mut bytes);

	URL_SAFE_NO_PAD.encode(bytes)
}

/// Timing-safe string equality; length differences still short-circuit.
pub fn constant_time_eq(lhs: &str, rhs: &str) -> bool {
	lhs.as_bytes().ct_eq(rhs.as_bytes()).into()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = Secret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "Secret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn constant_time_comparison_matches_equality() {
		assert!(constant_time_eq("state-value", "state-value"));
		assert!(!constant_time_eq("state-value", "state-valuE"));
		assert!(!constant_time_eq("short", "longer"));
		assert!(Secret::new("abc").matches("abc"));
	}

	#[test]
	fn random_values_have_expected_length() {
		assert_eq!(random_urlsafe(24).len(), 32);
		assert_eq!(random_urlsafe(32).len(), 43);
		assert_eq!(random_urlsafe(96).len(), 128);
		assert_ne!(random_urlsafe(32), random_urlsafe(32));
	}
}
