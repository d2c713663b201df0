//! Client registration data and the free-form option map.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	error::ConfigError,
};

/// Recognized keys for [`ClientConfig::option`].
pub mod options {
	/// Preferred client authentication method for the token endpoint, and the fallback for
	/// every other endpoint.
	pub const TOKEN_ENDPOINT_AUTH_METHOD: &str = "token_endpoint_auth_method";
	/// HMAC algorithm used by `client_secret_jwt` assertions (`HS256` by default).
	pub const CLIENT_ASSERTION_SIGNING_ALG: &str = "client_assertion_signing_alg";
	/// Forces the PKCE challenge method (`S256` or `plain`).
	pub const CODE_CHALLENGE_METHOD: &str = "code_challenge_method";
	/// Fails token responses that lack an ID Token when set to `true`.
	pub const ID_TOKEN_REQUIRED: &str = "id_token_required";
	/// Maximum age of an ID Token `iat`, in seconds (30 by default).
	pub const ID_TOKEN_MAX_SKEW: &str = "id_token_max_skew";
	/// Where userinfo requests carry the access token: `header`, `body`, or `query`.
	pub const USERINFO_TOKEN_PLACEMENT: &str = "userinfo_token_placement";
	/// Scope allow-list enforced by the scope validation extension.
	pub const ALLOWED_SCOPES: &str = "allowed_scopes";

	/// Per-endpoint authentication method key, e.g. `revocation_endpoint_auth_method`.
	pub fn endpoint_auth_method(endpoint: &str) -> String {
		format!("{endpoint}_endpoint_auth_method")
	}
}

/// Client registration as seen by the engine.
///
/// Setters follow copy-on-write semantics and return updated copies. The struct derives
/// serde so applications can load it from JSON or TOML configuration files.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
	client_id: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	client_secret: Option<Secret>,
	#[serde(default)]
	openid: bool,
	#[serde(default)]
	scopes: ScopeSet,
	#[serde(default, skip_serializing_if = "Map::is_empty")]
	options: Map<String, Value>,
}
impl ClientConfig {
	/// Creates a public client configuration.
	pub fn new(client_id: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: None,
			openid: false,
			scopes: ScopeSet::default(),
			options: Map::new(),
		}
	}

	/// Returns a copy carrying `secret`.
	pub fn with_secret(&self, secret: impl Into<Secret>) -> Self {
		Self { client_secret: Some(secret.into()), ..self.clone() }
	}

	/// Returns a copy with OpenID Connect enabled or disabled.
	pub fn with_openid(&self, openid: bool) -> Self {
		Self { openid, ..self.clone() }
	}

	/// Returns a copy requesting `scopes` by default.
	pub fn with_scopes(&self, scopes: ScopeSet) -> Self {
		Self { scopes, ..self.clone() }
	}

	/// Returns a copy with option `key` set to `value`.
	pub fn with_option(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		let mut options = self.options.clone();

		options.insert(key.into(), value.into());

		Self { options, ..self.clone() }
	}

	/// Client identifier.
	pub fn client_id(&self) -> &str {
		&self.client_id
	}

	/// Client secret, if the client is confidential.
	pub fn client_secret(&self) -> Option<&Secret> {
		self.client_secret.as_ref()
	}

	/// Whether OpenID Connect behavior is requested.
	pub fn openid(&self) -> bool {
		self.openid
	}

	/// Default requested scopes.
	pub fn scopes(&self) -> &ScopeSet {
		&self.scopes
	}

	/// Raw option value.
	pub fn option(&self, key: &str) -> Option<&Value> {
		self.options.get(key).filter(|value| !value.is_null())
	}

	/// String option; other JSON types are rejected.
	pub fn option_str(&self, key: &str) -> Result<Option<&str>, ConfigError> {
		match self.option(key) {
			None => Ok(None),
			Some(Value::String(value)) => Ok(Some(value)),
			Some(_) => Err(invalid(key, "expected a string")),
		}
	}

	/// Boolean option; `"true"`/`"false"` strings are accepted.
	pub fn option_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
		match self.option(key) {
			None => Ok(None),
			Some(Value::Bool(value)) => Ok(Some(*value)),
			Some(Value::String(value)) =>
				value.parse().map(Some).map_err(|_| invalid(key, "expected a boolean")),
			Some(_) => Err(invalid(key, "expected a boolean")),
		}
	}

	/// Duration option expressed in whole seconds.
	pub fn option_seconds(&self, key: &str) -> Result<Option<Duration>, ConfigError> {
		let seconds = match self.option(key) {
			None => return Ok(None),
			Some(Value::Number(value)) => value.as_i64(),
			Some(Value::String(value)) => value.trim().parse().ok(),
			Some(_) => None,
		};

		match seconds {
			Some(seconds) if seconds >= 0 => Ok(Some(Duration::seconds(seconds))),
			_ => Err(invalid(key, "expected a non-negative number of seconds")),
		}
	}

	/// Scope-list option given either as a space-delimited string or a list of strings.
	pub fn option_scopes(&self, key: &str) -> Result<Option<ScopeSet>, ConfigError> {
		match self.option(key) {
			None => Ok(None),
			Some(value) => serde_json::from_value(value.clone())
				.map(Some)
				.map_err(|_| invalid(key, "expected a scope string or list")),
		}
	}
}

fn invalid(key: &str, reason: &str) -> ConfigError {
	ConfigError::InvalidOption { key: key.to_owned(), reason: reason.to_owned() }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn setters_copy_on_write() {
		let base = ClientConfig::new("client");
		let confidential = base.with_secret("secret").with_option(options::ID_TOKEN_REQUIRED, true);

		assert!(base.client_secret().is_none());
		assert!(base.option(options::ID_TOKEN_REQUIRED).is_none());
		assert_eq!(confidential.client_secret().map(Secret::expose), Some("secret"));
		assert_eq!(confidential.option_bool(options::ID_TOKEN_REQUIRED).ok().flatten(), Some(true));
	}

	#[test]
	fn typed_options_reject_wrong_types() {
		let config = ClientConfig::new("client")
			.with_option(options::ID_TOKEN_MAX_SKEW, "45")
			.with_option(options::CODE_CHALLENGE_METHOD, 5);

		assert_eq!(
			config.option_seconds(options::ID_TOKEN_MAX_SKEW).expect("Numeric string is valid."),
			Some(Duration::seconds(45))
		);
		assert!(matches!(
			config.option_str(options::CODE_CHALLENGE_METHOD),
			Err(ConfigError::InvalidOption { .. })
		));
	}

	#[test]
	fn deserializes_from_json() {
		let config: ClientConfig = serde_json::from_value(json!({
			"client_id": "app",
			"client_secret": "s3cr3t",
			"openid": true,
			"scopes": "email profile",
			"options": { "allowed_scopes": ["openid", "email"] },
		}))
		.expect("Client configuration should deserialize.");

		assert!(config.openid());
		assert_eq!(config.scopes().normalized(), "email profile");
		assert_eq!(
			config
				.option_scopes(options::ALLOWED_SCOPES)
				.expect("Allow-list should parse.")
				.map(|scopes| scopes.normalized()),
			Some("openid email".into())
		);
		assert!(!format!("{config:?}").contains("s3cr3t"), "Debug output must redact secrets.");
	}
}
