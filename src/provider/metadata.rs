//! Authorization server metadata (RFC 8414 / OpenID Connect Discovery 1.0).

// self
use crate::{_prelude::*, error::ConfigError, jose::JwkSet};

/// Immutable map of provider metadata.
///
/// Values are kept exactly as published so extensions can read fields the engine does not
/// model. The only invariant is the one discovery relies on: an `issuer` string plus at
/// least one `*_endpoint` URI.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct ProviderMetadata(Map<String, Value>);
impl ProviderMetadata {
	/// Starts a builder for `issuer`.
	pub fn builder(issuer: impl Into<String>) -> ProviderMetadataBuilder {
		ProviderMetadataBuilder::new(issuer)
	}

	/// Validates a published metadata document.
	pub fn from_map(map: Map<String, Value>) -> Result<Self, ConfigError> {
		match map.get("issuer") {
			Some(Value::String(issuer)) if !issuer.is_empty() => {},
			_ => return Err(invalid("`issuer` is missing")),
		}

		let mut endpoints = 0;

		for (key, value) in map.iter().filter(|(key, _)| key.ends_with("_endpoint")) {
			let Value::String(raw) = value else {
				return Err(invalid(format!("`{key}` is not a string")));
			};

			Url::parse(raw).map_err(|e| invalid(format!("`{key}` is not a URL ({e})")))?;

			endpoints += 1;
		}

		if endpoints == 0 {
			return Err(invalid("no endpoint is advertised"));
		}

		Ok(Self(map))
	}

	/// Issuer identifier.
	pub fn issuer(&self) -> &str {
		self.str("issuer").unwrap_or_default()
	}

	/// Raw metadata value.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key).filter(|value| !value.is_null())
	}

	/// String metadata value.
	pub fn str(&self, key: &str) -> Option<&str> {
		self.get(key)?.as_str()
	}

	/// Boolean metadata value, `false` when absent.
	pub fn flag(&self, key: &str) -> bool {
		self.get(key).and_then(Value::as_bool).unwrap_or(false)
	}

	/// List-of-strings metadata value (`*_supported` entries), empty when absent.
	pub fn strings(&self, key: &str) -> Vec<&str> {
		match self.get(key) {
			Some(Value::Array(values)) => values.iter().filter_map(Value::as_str).collect(),
			Some(Value::String(value)) => value.split_whitespace().collect(),
			_ => Vec::new(),
		}
	}

	/// URI of the `{name}_endpoint` entry.
	pub fn endpoint(&self, name: &str) -> Option<&str> {
		self.str(&format!("{name}_endpoint"))
	}

	/// Returns true when `{name}_endpoint` is advertised.
	pub fn supports(&self, name: &str) -> bool {
		self.endpoint(name).is_some()
	}

	/// Location of the provider's JWK set.
	pub fn jwks_uri(&self) -> Option<&str> {
		self.str("jwks_uri")
	}

	/// Inline JWK set (`jwks`), if the document embeds one.
	pub fn jwks(&self) -> Option<JwkSet> {
		serde_json::from_value(self.get("jwks")?.clone()).ok()
	}

	/// Returns a copy with `key` filled in, leaving the original untouched.
	pub fn with(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		let mut map = self.0.clone();

		map.insert(key.into(), value.into());

		Self(map)
	}

	/// Borrows the underlying document.
	pub fn as_map(&self) -> &Map<String, Value> {
		&self.0
	}
}
impl TryFrom<Map<String, Value>> for ProviderMetadata {
	type Error = ConfigError;

	fn try_from(value: Map<String, Value>) -> Result<Self, Self::Error> {
		Self::from_map(value)
	}
}
impl From<ProviderMetadata> for Map<String, Value> {
	fn from(value: ProviderMetadata) -> Self {
		value.0
	}
}

/// Builder for manually configured providers.
#[derive(Debug)]
pub struct ProviderMetadataBuilder {
	map: Map<String, Value>,
	require_https: bool,
}
impl ProviderMetadataBuilder {
	fn new(issuer: impl Into<String>) -> Self {
		let mut map = Map::new();

		map.insert("issuer".into(), Value::String(issuer.into()));

		Self { map, require_https: false }
	}

	/// Sets `{name}_endpoint`.
	pub fn endpoint(mut self, name: &str, url: impl Into<String>) -> Self {
		self.map.insert(format!("{name}_endpoint"), Value::String(url.into()));

		self
	}

	/// Sets `jwks_uri`.
	pub fn jwks_uri(mut self, url: impl Into<String>) -> Self {
		self.map.insert("jwks_uri".into(), Value::String(url.into()));

		self
	}

	/// Embeds a JWK set under `jwks`.
	pub fn jwks(mut self, keys: &JwkSet) -> Self {
		if let Ok(value) = serde_json::to_value(keys) {
			self.map.insert("jwks".into(), value);
		}

		self
	}

	/// Sets any other metadata entry.
	pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
		self.map.insert(key.into(), value.into());

		self
	}

	/// Rejects non-HTTPS issuers and endpoints at build time.
	pub fn require_https(mut self, require: bool) -> Self {
		self.require_https = require;

		self
	}

	/// Validates and builds the metadata.
	pub fn build(self) -> Result<ProviderMetadata, ConfigError> {
		let metadata = ProviderMetadata::from_map(self.map)?;

		if self.require_https {
			for (key, value) in metadata.as_map() {
				let is_location =
					key == "issuer" || key == "jwks_uri" || key.ends_with("_endpoint");

				if let (true, Some(raw)) = (is_location, value.as_str()) {
					if !raw.starts_with("https://") {
						return Err(invalid(format!("`{key}` must use HTTPS")));
					}
				}
			}
		}

		Ok(metadata)
	}
}

fn invalid(reason: impl Into<String>) -> ConfigError {
	ConfigError::InvalidMetadata { reason: reason.into() }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	#[test]
	fn metadata_requires_issuer_and_an_endpoint() {
		let missing_issuer =
			json!({ "token_endpoint": "https://idp.example.com/token" }).as_object().cloned();
		let missing_endpoint = json!({ "issuer": "https://idp.example.com" }).as_object().cloned();

		assert!(ProviderMetadata::from_map(missing_issuer.unwrap_or_default()).is_err());
		assert!(ProviderMetadata::from_map(missing_endpoint.unwrap_or_default()).is_err());
		assert!(ProviderMetadata::builder("https://idp.example.com").build().is_err());
	}

	#[test]
	fn builder_exposes_endpoints_and_lists() {
		let metadata = ProviderMetadata::builder("https://idp.example.com")
			.endpoint("token", "https://idp.example.com/token")
			.set("code_challenge_methods_supported", json!(["S256", "plain"]))
			.build()
			.expect("Metadata with a token endpoint should build.");

		assert_eq!(metadata.issuer(), "https://idp.example.com");
		assert_eq!(metadata.endpoint("token"), Some("https://idp.example.com/token"));
		assert!(!metadata.supports("revocation"));
		assert_eq!(metadata.strings("code_challenge_methods_supported"), vec!["S256", "plain"]);
		assert!(metadata.strings("scopes_supported").is_empty());
	}

	#[test]
	fn https_can_be_enforced() {
		let err = ProviderMetadata::builder("https://idp.example.com")
			.endpoint("token", "http://idp.example.com/token")
			.require_https(true)
			.build()
			.expect_err("Plain HTTP endpoints must be rejected.");

		assert!(matches!(err, ConfigError::InvalidMetadata { .. }));
	}

	#[test]
	fn deserialization_validates() {
		let ok: Result<ProviderMetadata, _> = serde_json::from_value(json!({
			"issuer": "https://idp.example.com",
			"authorization_endpoint": "https://idp.example.com/auth",
		}));
		let bad: Result<ProviderMetadata, _> =
			serde_json::from_value(json!({ "issuer": "https://idp.example.com" }));

		assert!(ok.is_ok());
		assert!(bad.is_err());
	}

	#[test]
	fn with_is_a_fill_in() {
		let metadata = ProviderMetadata::builder("https://idp.example.com")
			.endpoint("token", "https://idp.example.com/token")
			.build()
			.expect("Metadata should build.");
		let filled = metadata.with("jwks_uri", "https://idp.example.com/jwks");

		assert!(metadata.jwks_uri().is_none());
		assert_eq!(filled.jwks_uri(), Some("https://idp.example.com/jwks"));
	}
}
