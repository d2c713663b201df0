//! Provider metadata, HTTP round trips, and error translation.
//!
//! [`Provider`] is the single chokepoint between endpoints and the network: endpoints
//! describe *what* to send, the provider resolves URIs from [`ProviderMetadata`], executes
//! the request through the configured [`HttpTransport`], and turns 4xx/5xx bodies into
//! [`ProtocolError`] values. `discovery` resolves metadata from well-known documents and
//! caches it behind a pluggable [`ConfigCache`](crate::store::ConfigCache).

pub mod discovery;
pub mod metadata;

pub use discovery::*;
pub use metadata::*;

// crates.io
use oauth2::http::{
	HeaderValue, Method, Request, StatusCode,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	endpoint::Params,
	error::{ConfigError, ErrorCode, ProtocolError},
	http::{self, HttpRequest, HttpResponse, HttpTransport},
	jose::{JwkSet, JwtCodec},
	response,
};

/// Form content type used for every OAuth POST body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// Request body accepted by [`Provider::request`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestBody {
	/// No body.
	Empty,
	/// URL-encoded form body.
	Form(Params),
	/// Pre-encoded bytes passed through unchanged.
	Raw {
		/// `Content-Type` header value.
		content_type: String,
		/// Body bytes.
		bytes: Vec<u8>,
	},
}

/// Remote authorization server bound to its metadata and an HTTP transport.
///
/// Providers are shared by every client created from them. The only interior state is the
/// lazily fetched key set, which is filled once and never changes afterwards.
pub struct Provider {
	metadata: ProviderMetadata,
	openid: bool,
	http: Arc<dyn HttpTransport>,
	codec: JwtCodec,
	preloaded_keys: Option<JwkSet>,
	key_set: AsyncOnceCell<JwkSet>,
}
impl Provider {
	/// Creates a provider; the codec honors `id_token_signing_alg_values_supported`.
	pub fn new(metadata: ProviderMetadata, http: Arc<dyn HttpTransport>) -> Self {
		let advertised = metadata.strings("id_token_signing_alg_values_supported");
		let codec = if advertised.is_empty() {
			JwtCodec::default()
		} else {
			JwtCodec::default().filter(advertised)
		};

		Self {
			metadata,
			openid: false,
			http,
			codec,
			preloaded_keys: None,
			key_set: AsyncOnceCell::new(),
		}
	}

	/// Marks the provider as OpenID Connect capable.
	pub fn with_openid(mut self, openid: bool) -> Self {
		self.openid = openid;

		self
	}

	/// Supplies the key set up front, skipping `jwks`/`jwks_uri` resolution.
	pub fn with_key_set(mut self, keys: JwkSet) -> Self {
		self.preloaded_keys = Some(keys);

		self
	}

	/// Overrides the JWS codec.
	pub fn with_codec(mut self, codec: JwtCodec) -> Self {
		self.codec = codec;

		self
	}

	/// Provider metadata.
	pub fn metadata(&self) -> &ProviderMetadata {
		&self.metadata
	}

	/// Issuer identifier.
	pub fn issuer(&self) -> &str {
		self.metadata.issuer()
	}

	/// Whether the provider speaks OpenID Connect.
	pub fn is_openid(&self) -> bool {
		self.openid
	}

	/// Codec used for ID Tokens, JWT userinfo, and local introspection.
	pub fn codec(&self) -> &JwtCodec {
		&self.codec
	}

	/// Transport shared by every request.
	pub fn http(&self) -> &Arc<dyn HttpTransport> {
		&self.http
	}

	/// Returns true when `{name}_endpoint` is advertised.
	pub fn supports(&self, name: &str) -> bool {
		self.metadata.supports(name)
	}

	/// Builds the URI of endpoint `name` with `params` appended to its query.
	pub fn uri(&self, name: &str, params: &Params) -> Result<Url> {
		let raw = self.metadata.endpoint(name).ok_or_else(|| Error::unsupported(name))?;
		let mut url = Url::parse(raw).map_err(|e| ConfigError::invalid_url(raw, e))?;

		if !params.is_empty() {
			url.query_pairs_mut().extend_pairs(params.iter());
		}

		Ok(url)
	}

	/// Builds a request for endpoint `name`.
	pub fn request(
		&self,
		method: Method,
		name: &str,
		query: &Params,
		body: RequestBody,
	) -> Result<HttpRequest> {
		let url = self.uri(name, query)?;

		build_request(method, &url, body)
	}

	/// Executes `request`, mapping non-success responses into [`ProtocolError`].
	pub async fn send_request(&self, request: HttpRequest) -> Result<HttpResponse> {
		let response = self.http.execute(request).await?;

		if response.status().is_success() {
			Ok(response)
		} else {
			Err(protocol_error(&response).into())
		}
	}

	/// Key set used to verify provider-signed JWTs.
	///
	/// Resolution order: a preloaded set, the inline `jwks` member, then `jwks_uri`. A
	/// provider with none of them yields an empty set, so every verification fails closed.
	pub async fn key_set(&self) -> Result<&JwkSet> {
		self.key_set.get_or_try_init(|| self.load_key_set()).await
	}

	async fn load_key_set(&self) -> Result<JwkSet> {
		if let Some(keys) = &self.preloaded_keys {
			return Ok(keys.clone());
		}
		if let Some(keys) = self.metadata.jwks() {
			return Ok(keys);
		}

		let Some(raw) = self.metadata.jwks_uri() else {
			return Ok(JwkSet { keys: Vec::new() });
		};
		let url = Url::parse(raw).map_err(|e| ConfigError::invalid_url(raw, e))?;
		let request = build_request(Method::GET, &url, RequestBody::Empty)?;
		let response = self.send_request(request).await?;

		response::parse_json("jwks", response.body())
	}
}
impl Debug for Provider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Provider")
			.field("issuer", &self.issuer())
			.field("openid", &self.openid)
			.field("key_set_loaded", &self.key_set.is_initialized())
			.finish()
	}
}

pub(crate) fn build_request(method: Method, url: &Url, body: RequestBody) -> Result<HttpRequest> {
	let builder = Request::builder()
		.method(method)
		.uri(url.as_str())
		.header(ACCEPT, HeaderValue::from_static("application/json"));
	let request = match body {
		RequestBody::Empty => builder.body(Vec::new()),
		RequestBody::Form(params) => builder
			.header(CONTENT_TYPE, HeaderValue::from_static(FORM_CONTENT_TYPE))
			.body(params.to_urlencoded().into_bytes()),
		RequestBody::Raw { content_type, bytes } =>
			builder.header(CONTENT_TYPE, content_type).body(bytes),
	};

	Ok(request.map_err(ConfigError::from)?)
}

/// Translates an error response into the OAuth error taxonomy.
pub fn protocol_error(response: &HttpResponse) -> ProtocolError {
	let status = response.status();
	let retry_after = http::retry_after(response.headers());
	let body = response.body();

	if let Ok(Value::Object(map)) = serde_json::from_slice::<Value>(body) {
		if let Some(Value::String(code)) = map.get("error") {
			return structured(
				code,
				map.get("error_description").and_then(Value::as_str),
				map.get("error_uri").and_then(Value::as_str),
				status,
				retry_after,
			);
		}
	}
	if body.iter().all(u8::is_ascii_whitespace) {
		if let Some(challenge) = http::bearer_challenge(response.headers()) {
			if let Some(code) = challenge.get("error") {
				return structured(
					code,
					challenge.get("error_description").map(String::as_str),
					challenge.get("error_uri").map(String::as_str),
					status,
					retry_after,
				);
			}
		}
	}

	ProtocolError::unstructured(status.as_u16(), String::from_utf8_lossy(body))
		.with_retry_after(retry_after)
}

fn structured(
	code: &str,
	description: Option<&str>,
	uri: Option<&str>,
	status: StatusCode,
	retry_after: Option<Duration>,
) -> ProtocolError {
	let mut error = ProtocolError::new(ErrorCode::parse(code))
		.with_status(status.as_u16())
		.with_retry_after(retry_after);

	if let Some(description) = description {
		error = error.with_description(description);
	}
	if let Some(uri) = uri {
		error = error.with_uri(uri);
	}

	error
}
