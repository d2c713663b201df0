//! OpenID Connect userinfo endpoint (Core §5.3).

// crates.io
use oauth2::http::{HeaderValue, Method, header::AUTHORIZATION};
// self
use crate::{
	_prelude::*,
	client::{CallContext, ClientConfig, options},
	endpoint::{self, Listeners, Params, ResponseListener},
	error::ConfigError,
	http,
	jose::DecodeError,
	obs::{self, OperationKind},
	provider::RequestBody,
	response::{self, UserinfoResponse},
};

/// Media type of signed userinfo responses.
pub const JWT_MEDIA_TYPE: &str = "application/jwt";

/// Where the bearer token travels (RFC 6750 §2).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TokenPlacement {
	/// `Authorization: Bearer` header on a `GET`.
	#[default]
	Header,
	/// `access_token` form field on a `POST`.
	Body,
	/// `access_token` query parameter on a `GET`.
	Query,
}
impl TokenPlacement {
	/// Reads the `userinfo_token_placement` option.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		match config.option_str(options::USERINFO_TOKEN_PLACEMENT)? {
			None | Some("header") => Ok(Self::Header),
			Some("body") => Ok(Self::Body),
			Some("query") => Ok(Self::Query),
			Some(other) => Err(ConfigError::InvalidOption {
				key: options::USERINFO_TOKEN_PLACEMENT.into(),
				reason: format!("`{other}` is not one of `header`, `body`, `query`"),
			}),
		}
	}
}

/// Userinfo request; `access_token` is mandatory.
#[derive(Clone)]
pub struct UserinfoEndpoint {
	name: String,
	params: Params,
	listeners: Listeners<UserinfoResponse>,
}
impl UserinfoEndpoint {
	/// Creates an endpoint without parameters or listeners.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Params::new(), listeners: Vec::new() }
	}

	/// Returns a copy with `listener` appended.
	pub fn with_listener(&self, listener: Arc<dyn ResponseListener<UserinfoResponse>>) -> Self {
		let mut next = self.clone();

		next.listeners.push(listener);

		next
	}

	/// Fetches the claims and runs the listeners in order.
	///
	/// `application/jwt` responses are verified against the provider key set, and against
	/// the client secret for `HS*` signatures.
	pub async fn call(&self, ctx: &CallContext) -> Result<UserinfoResponse> {
		obs::observe(OperationKind::Userinfo, "call", async {
			let Some(token) = self.params.get("access_token") else {
				return Err(endpoint::missing(&self.name, "access_token"));
			};
			let provider = ctx.provider();
			let request = match TokenPlacement::from_config(ctx.config())? {
				TokenPlacement::Header => {
					let mut request = provider.request(
						Method::GET,
						&self.name,
						&self.params.without("access_token"),
						RequestBody::Empty,
					)?;
					let value = HeaderValue::from_str(&format!("Bearer {token}"))
						.map_err(|e| ConfigError::from(oauth2::http::Error::from(e)))?;

					request.headers_mut().insert(AUTHORIZATION, value);

					request
				},
				TokenPlacement::Body => provider.request(
					Method::POST,
					&self.name,
					&Params::new(),
					RequestBody::Form(self.params.clone()),
				)?,
				TokenPlacement::Query =>
					provider.request(Method::GET, &self.name, &self.params, RequestBody::Empty)?,
			};
			let response = provider.send_request(request).await?;
			let is_jwt = http::media_type(response.headers()).as_deref() == Some(JWT_MEDIA_TYPE);
			let userinfo = if is_jwt {
				let raw = std::str::from_utf8(response.body())
					.map_err(|_| DecodeError::Malformed { reason: "body is not UTF-8" })?;
				let secret =
					ctx.config().client_secret().map(|secret| secret.expose().as_bytes());
				let keys = provider.key_set().await?;
				let jwt = provider.codec().decode_with(raw.trim(), keys, secret)?;

				UserinfoResponse::from_jwt(jwt)
			} else {
				UserinfoResponse::from_claims(response::parse_json("userinfo", response.body())?)
			};

			endpoint::notify(&self.listeners, ctx, userinfo).await
		})
		.await
	}
}
impl PartialEq for UserinfoEndpoint {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.params == other.params
	}
}
impl Debug for UserinfoEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("UserinfoEndpoint")
			.field("name", &self.name)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
super::endpoint_kind!(UserinfoEndpoint, Userinfo);
