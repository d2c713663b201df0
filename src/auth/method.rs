//! Client authentication methods (RFC 6749 §2.3, OpenID Connect Core §9).

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::http::{HeaderValue, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	auth::random_urlsafe,
	client::{ClientConfig, options},
	error::ConfigError,
	http::HttpRequest,
	jose::{Algorithm, AlgorithmSet, Claims, EncodingKey, JwtCodec, algorithm_name, hmac_key_len},
	provider::ProviderMetadata,
};

/// `client_assertion_type` value for JWT bearer assertions (RFC 7523).
pub const JWT_BEARER_ASSERTION_TYPE: &str =
	"urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Strategy that attaches client credentials to an outgoing request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClientAuthMethod {
	/// `Authorization: Basic base64(client_id:client_secret)`.
	ClientSecretBasic,
	/// `client_id` and `client_secret` appended to the form body.
	ClientSecretPost,
	/// HMAC-signed JWT assertion derived from the client secret.
	ClientSecretJwt(JwtBearer),
	/// Public client; only `client_id` is sent in the form body.
	None,
}
impl ClientAuthMethod {
	/// Names of the methods this engine implements, in registration-metadata spelling.
	pub const SUPPORTED: [&'static str; 4] =
		["client_secret_basic", "client_secret_post", "client_secret_jwt", "none"];

	/// Builds the method registered under `name`.
	pub fn from_name(name: &str, config: &ClientConfig) -> Result<Self, ConfigError> {
		match name {
			"client_secret_basic" => Ok(Self::ClientSecretBasic),
			"client_secret_post" => Ok(Self::ClientSecretPost),
			"client_secret_jwt" => JwtBearer::from_config(config).map(Self::ClientSecretJwt),
			"none" => Ok(Self::None),
			other => Err(ConfigError::UnsupportedAuthMethod { method: other.to_owned() }),
		}
	}

	/// Picks the method for `endpoint`.
	///
	/// Order: the `{endpoint}_endpoint_auth_method` option, the `token_endpoint_auth_method`
	/// option, the first usable method the provider advertises for the endpoint (then for
	/// the token endpoint), and finally `client_secret_basic` for confidential clients or
	/// `none` for public ones. Explicit options are honored even when they cannot work, so
	/// a missing secret surfaces as an error instead of a silent downgrade.
	pub fn select(
		endpoint: &str,
		config: &ClientConfig,
		metadata: &ProviderMetadata,
	) -> Result<Self, ConfigError> {
		let preferred = match config.option_str(&options::endpoint_auth_method(endpoint))? {
			Some(name) => Some(name),
			None => config.option_str(options::TOKEN_ENDPOINT_AUTH_METHOD)?,
		};

		if let Some(name) = preferred {
			let method = Self::from_name(name, config)?;

			method.ensure_usable(config)?;

			return Ok(method.restricted_by(endpoint, metadata));
		}

		let advertised = [endpoint, "token"]
			.into_iter()
			.map(|name| metadata.strings(&format!("{name}_endpoint_auth_methods_supported")))
			.find(|methods| !methods.is_empty())
			.unwrap_or_default();

		for name in advertised {
			if let Ok(method) = Self::from_name(name, config) {
				if method.ensure_usable(config).is_ok() {
					return Ok(method.restricted_by(endpoint, metadata));
				}
			}
		}

		Ok(if config.client_secret().is_some() { Self::ClientSecretBasic } else { Self::None })
	}

	/// Registration-metadata name of the method.
	pub fn name(&self) -> &'static str {
		match self {
			Self::ClientSecretBasic => "client_secret_basic",
			Self::ClientSecretPost => "client_secret_post",
			Self::ClientSecretJwt(_) => "client_secret_jwt",
			Self::None => "none",
		}
	}

	/// Returns a method restricted to `allowed` signing algorithms.
	///
	/// Methods that do not sign anything are returned unchanged.
	pub fn with_signing_algorithms(&self, allowed: &[Algorithm]) -> Self {
		match self {
			Self::ClientSecretJwt(bearer) =>
				Self::ClientSecretJwt(bearer.with_signing_algorithms(allowed)),
			other => other.clone(),
		}
	}

	/// Attaches the client's credentials to `request`.
	pub fn apply(&self, config: &ClientConfig, request: HttpRequest) -> Result<HttpRequest> {
		match self {
			Self::ClientSecretBasic => {
				let secret = require_secret(config, self.name())?;
				let credentials =
					STANDARD.encode(format!("{}:{}", config.client_id(), secret.expose()));
				let mut request = request;
				let value = HeaderValue::from_str(&format!("Basic {credentials}"))
					.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

				request.headers_mut().insert(AUTHORIZATION, value);

				Ok(request)
			},
			Self::ClientSecretPost => {
				let secret = require_secret(config, self.name())?;

				Ok(append_form(request, &[
					("client_id", config.client_id()),
					("client_secret", secret.expose()),
				]))
			},
			Self::ClientSecretJwt(bearer) => {
				let audience = audience(&request);
				let assertion = bearer.assertion(config, &audience)?;

				Ok(append_form(request, &[
					("client_id", config.client_id()),
					("client_assertion_type", JWT_BEARER_ASSERTION_TYPE),
					("client_assertion", &assertion),
				]))
			},
			Self::None => Ok(append_form(request, &[("client_id", config.client_id())])),
		}
	}

	fn ensure_usable(&self, config: &ClientConfig) -> Result<(), ConfigError> {
		match self {
			Self::None => Ok(()),
			Self::ClientSecretJwt(bearer) => bearer.check_secret(config),
			_ => require_secret(config, self.name()).map(|_| ()),
		}
	}

	fn restricted_by(self, endpoint: &str, metadata: &ProviderMetadata) -> Self {
		let key = format!("{endpoint}_endpoint_auth_signing_alg_values_supported");
		let advertised = AlgorithmSet::all().filter(metadata.strings(&key));

		if advertised.is_empty() {
			self
		} else {
			self.with_signing_algorithms(&advertised.iter().collect::<Vec<_>>())
		}
	}
}

/// `client_secret_jwt` assertion builder.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JwtBearer {
	algorithms: AlgorithmSet,
	preferred: Algorithm,
	lifetime: Duration,
}
impl JwtBearer {
	/// Default assertion lifetime.
	pub const DEFAULT_LIFETIME: Duration = Duration::seconds(30);

	/// Creates a bearer signing with `preferred`, which must be an HMAC algorithm.
	pub fn new(preferred: Algorithm) -> Result<Self, ConfigError> {
		let algorithms = AlgorithmSet::all().hmac();

		if !algorithms.contains(preferred) {
			return Err(ConfigError::UnsupportedAlgorithm {
				algorithm: algorithm_name(preferred).to_owned(),
			});
		}

		Ok(Self { algorithms, preferred, lifetime: Self::DEFAULT_LIFETIME })
	}

	/// Builds a bearer from the `client_assertion_signing_alg` option (`HS256` by default).
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		let preferred = match config.option_str(options::CLIENT_ASSERTION_SIGNING_ALG)? {
			Some(name) => AlgorithmSet::all()
				.hmac()
				.get(name)
				.ok_or_else(|| ConfigError::UnsupportedAlgorithm { algorithm: name.to_owned() })?,
			None => Algorithm::HS256,
		};

		Self::new(preferred)
	}

	/// Returns a copy whose assertions expire after `lifetime`.
	pub fn with_lifetime(&self, lifetime: Duration) -> Self {
		Self { lifetime, ..self.clone() }
	}

	/// Returns a copy restricted to the intersection with `allowed`.
	pub fn with_signing_algorithms(&self, allowed: &[Algorithm]) -> Self {
		Self { algorithms: self.algorithms.restrict(allowed), ..self.clone() }
	}

	/// Algorithm the next assertion will be signed with.
	pub fn algorithm(&self) -> Result<Algorithm, ConfigError> {
		if self.algorithms.contains(self.preferred) {
			return Ok(self.preferred);
		}

		self.algorithms.iter().next().ok_or_else(|| ConfigError::UnsupportedAlgorithm {
			algorithm: algorithm_name(self.preferred).to_owned(),
		})
	}

	/// Signs an assertion for `audience` (the endpoint URI without query or fragment).
	pub fn assertion(&self, config: &ClientConfig, audience: &str) -> Result<String> {
		self.check_secret(config)?;

		let algorithm = self.algorithm()?;
		let secret = require_secret(config, "client_secret_jwt")?;
		let now = OffsetDateTime::now_utc().unix_timestamp();
		let claims = Claims::new()
			.with("iss", config.client_id())
			.with("sub", config.client_id())
			.with("aud", audience)
			.with("exp", now.saturating_add(self.lifetime.whole_seconds()))
			.with("iat", now)
			.with("nbf", now)
			.with("jti", random_urlsafe(24));

		Ok(JwtCodec::new(self.algorithms.clone()).encode(
			algorithm,
			&EncodingKey::from_secret(secret.expose().as_bytes()),
			None,
			&claims,
		)?)
	}

	fn check_secret(&self, config: &ClientConfig) -> Result<(), ConfigError> {
		let secret = require_secret(config, "client_secret_jwt")?;
		let algorithm = self.algorithm()?;
		let required = hmac_key_len(algorithm).unwrap_or_default();

		if secret.expose().len() < required {
			return Err(ConfigError::WeakClientSecret {
				algorithm: algorithm_name(algorithm),
				required,
			});
		}

		Ok(())
	}
}

fn require_secret<'a>(
	config: &'a ClientConfig,
	method: &'static str,
) -> Result<&'a crate::auth::Secret, ConfigError> {
	config.client_secret().ok_or(ConfigError::MissingClientSecret { method })
}

fn append_form(mut request: HttpRequest, pairs: &[(&str, &str)]) -> HttpRequest {
	let encoded = url::form_urlencoded::Serializer::new(String::new())
		.extend_pairs(pairs.iter().copied())
		.finish();
	let body = request.body_mut();

	if !body.is_empty() {
		body.push(b'&');
	}

	body.extend_from_slice(encoded.as_bytes());

	request
}

fn audience(request: &HttpRequest) -> String {
	let uri = request.uri().to_string();

	match Url::parse(&uri) {
		Ok(mut url) => {
			url.set_query(None);
			url.set_fragment(None);

			url.to_string()
		},
		Err(_) => uri.split(['?', '#']).next().unwrap_or_default().to_owned(),
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use oauth2::http::{Method, Request};
	use serde_json::json;
	// self
	use super::*;
	use crate::jose::{JwkSet, symmetric_jwk};

	const LONG_SECRET: &str = "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

	fn token_request(body: &str) -> HttpRequest {
		Request::builder()
			.method(Method::POST)
			.uri("https://idp.example.com/token?tenant=a")
			.body(body.as_bytes().to_vec())
			.expect("Request fixture should build.")
	}

	fn metadata(extra: Value) -> ProviderMetadata {
		let mut map = json!({
			"issuer": "https://idp.example.com",
			"token_endpoint": "https://idp.example.com/token",
		})
		.as_object()
		.cloned()
		.unwrap_or_default();

		if let Value::Object(extra) = extra {
			map.extend(extra);
		}

		ProviderMetadata::from_map(map).expect("Metadata fixture should be valid.")
	}

	fn body(request: &HttpRequest) -> String {
		String::from_utf8(request.body().clone()).expect("Body should be UTF-8.")
	}

	#[test]
	fn basic_sets_authorization_header() {
		let config = ClientConfig::new("client").with_secret("secret");
		let request = ClientAuthMethod::ClientSecretBasic
			.apply(&config, token_request("grant_type=client_credentials"))
			.expect("Basic authentication should apply.");

		assert_eq!(
			request.headers().get(AUTHORIZATION).and_then(|v| v.to_str().ok()),
			Some("Basic Y2xpZW50OnNlY3JldA==")
		);
		assert_eq!(body(&request), "grant_type=client_credentials");
	}

	#[test]
	fn post_appends_credentials_with_ampersand() {
		let config = ClientConfig::new("client").with_secret("s&cret");
		let request = ClientAuthMethod::ClientSecretPost
			.apply(&config, token_request("grant_type=client_credentials"))
			.expect("Body authentication should apply.");

		assert_eq!(
			body(&request),
			"grant_type=client_credentials&client_id=client&client_secret=s%26cret"
		);

		let empty = ClientAuthMethod::ClientSecretPost
			.apply(&config, token_request(""))
			.expect("Body authentication should apply to empty bodies.");

		assert_eq!(body(&empty), "client_id=client&client_secret=s%26cret");
	}

	#[test]
	fn secret_methods_require_a_secret() {
		let config = ClientConfig::new("public");
		let err = ClientAuthMethod::ClientSecretBasic
			.apply(&config, token_request(""))
			.expect_err("Basic authentication needs a secret.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::MissingClientSecret { method: "client_secret_basic" })
		));
	}

	#[test]
	fn jwt_assertion_carries_expected_claims() {
		let config = ClientConfig::new("client").with_secret(LONG_SECRET);
		let method = ClientAuthMethod::from_name("client_secret_jwt", &config)
			.expect("JWT bearer should build with the default algorithm.");
		let request = method
			.apply(&config, token_request("grant_type=client_credentials"))
			.expect("JWT bearer authentication should apply.");
		let params = crate::endpoint::Params::from_urlencoded(&body(&request));

		assert_eq!(params.get("client_assertion_type"), Some(JWT_BEARER_ASSERTION_TYPE));

		let keys = JwkSet {
			keys: vec![
				symmetric_jwk(LONG_SECRET.as_bytes(), Algorithm::HS256, None)
					.expect("Symmetric key should build."),
			],
		};
		let jwt = JwtCodec::default()
			.decode(params.get("client_assertion").unwrap_or_default(), &keys)
			.expect("Assertion should verify with the client secret.");
		let claims = jwt.claims();
		let now = OffsetDateTime::now_utc().unix_timestamp();

		assert_eq!(jwt.algorithm(), Algorithm::HS256);
		assert_eq!(claims.str("iss"), Some("client"));
		assert_eq!(claims.str("sub"), Some("client"));
		assert_eq!(claims.str("aud"), Some("https://idp.example.com/token"));
		assert_eq!(claims.str("jti").map(str::len), Some(32));
		assert!((claims.i64("exp").unwrap_or_default() - now - 30).abs() <= 2);
		assert_eq!(claims.i64("iat"), claims.i64("nbf"));
	}

	#[test]
	fn jwt_rejects_short_secrets() {
		let config = ClientConfig::new("client")
			.with_secret("too-short")
			.with_option(options::CLIENT_ASSERTION_SIGNING_ALG, "HS512");
		let method = ClientAuthMethod::from_name("client_secret_jwt", &config)
			.expect("HS512 is a supported HMAC algorithm.");
		let err = method.apply(&config, token_request("")).expect_err("Weak secrets must fail.");

		assert!(matches!(
			err,
			Error::Config(ConfigError::WeakClientSecret { algorithm: "HS512", required: 64 })
		));
	}

	#[test]
	fn signing_restriction_intersects_algorithms() {
		let bearer = JwtBearer::new(Algorithm::HS512).expect("HS512 is an HMAC algorithm.");
		let restricted = bearer.with_signing_algorithms(&[Algorithm::HS256, Algorithm::RS256]);

		assert_eq!(restricted.algorithm().ok(), Some(Algorithm::HS256));
		assert!(bearer.with_signing_algorithms(&[Algorithm::RS256]).algorithm().is_err());
		assert_eq!(
			ClientAuthMethod::ClientSecretPost.with_signing_algorithms(&[]),
			ClientAuthMethod::ClientSecretPost
		);
		assert!(JwtBearer::new(Algorithm::RS256).is_err());
	}

	#[test]
	fn selection_prefers_options_then_metadata() {
		let confidential = ClientConfig::new("client").with_secret(LONG_SECRET);
		let advertised = metadata(json!({
			"token_endpoint_auth_methods_supported": ["private_key_jwt", "client_secret_post"],
		}));

		assert_eq!(
			ClientAuthMethod::select("token", &confidential, &advertised).map(|m| m.name()).ok(),
			Some("client_secret_post")
		);
		assert_eq!(
			ClientAuthMethod::select("revocation", &confidential, &advertised)
				.map(|m| m.name())
				.ok(),
			Some("client_secret_post"),
			"Revocation falls back to the token endpoint's advertised methods."
		);

		let forced =
			confidential.with_option(options::endpoint_auth_method("token"), "client_secret_jwt");

		assert_eq!(
			ClientAuthMethod::select("token", &forced, &advertised).map(|m| m.name()).ok(),
			Some("client_secret_jwt")
		);
		assert_eq!(
			ClientAuthMethod::select("token", &confidential, &metadata(json!({})))
				.map(|m| m.name())
				.ok(),
			Some("client_secret_basic")
		);
		assert_eq!(
			ClientAuthMethod::select("token", &ClientConfig::new("public"), &advertised)
				.map(|m| m.name())
				.ok(),
			Some("none")
		);
	}

	#[test]
	fn explicit_option_without_secret_fails() {
		let config = ClientConfig::new("public")
			.with_option(options::TOKEN_ENDPOINT_AUTH_METHOD, "client_secret_basic");

		assert!(matches!(
			ClientAuthMethod::select("token", &config, &metadata(json!({}))),
			Err(ConfigError::MissingClientSecret { .. })
		));
		assert!(matches!(
			ClientAuthMethod::from_name("tls_client_auth", &config),
			Err(ConfigError::UnsupportedAuthMethod { .. })
		));
	}
}
