//! Proof Key for Code Exchange (RFC 7636).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::random_urlsafe,
	client::{CallContext, ClientContext, options},
	endpoint::{AuthorizationEndpoint, Extension, TokenEndpoint, Transformer},
	error::ConfigError,
	store::{SessionStore, keys},
};

/// Number of random bytes behind a code verifier (128 base64url characters).
pub const VERIFIER_BYTES: usize = 96;

/// Code challenge transformation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceMethod {
	/// `base64url(sha256(verifier))`.
	S256,
	/// The verifier itself.
	Plain,
}
impl PkceMethod {
	/// Wire value of `code_challenge_method`.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::S256 => "S256",
			Self::Plain => "plain",
		}
	}

	/// Parses a `code_challenge_method` value.
	pub fn parse(value: &str) -> Option<Self> {
		match value {
			"S256" => Some(Self::S256),
			"plain" => Some(Self::Plain),
			_ => None,
		}
	}

	/// Derives the code challenge for `verifier`.
	pub fn challenge(self, verifier: &str) -> String {
		match self {
			Self::S256 => URL_SAFE_NO_PAD.encode(Sha256::digest(verifier.as_bytes())),
			Self::Plain => verifier.to_owned(),
		}
	}
}

/// PKCE extension.
///
/// Authorization requests get a fresh verifier, stored in the session, and its challenge.
/// The next `authorization_code` token request consumes the verifier.
#[derive(Clone, Debug, Default)]
pub struct Pkce {
	method: Option<PkceMethod>,
}
impl Pkce {
	/// Negotiates the method from client options and provider metadata.
	pub fn new() -> Self {
		Self::default()
	}

	/// Forces `method`, ignoring options and metadata.
	pub fn with_method(mut self, method: PkceMethod) -> Self {
		self.method = Some(method);

		self
	}

	/// Verifier stored for the pending authorization request, without consuming it.
	pub fn pending_verifier(store: &Arc<dyn SessionStore>) -> Result<Option<String>> {
		Ok(store.get_as(keys::PKCE_VERIFIER)?)
	}

	fn negotiate(&self, ctx: &CallContext) -> PkceMethod {
		if let Some(method) = self.method {
			return method;
		}

		let advertised = ctx.provider().metadata().strings("code_challenge_methods_supported");

		if advertised.is_empty() || advertised.contains(&"S256") {
			PkceMethod::S256
		} else if advertised.contains(&"plain") {
			PkceMethod::Plain
		} else {
			PkceMethod::S256
		}
	}
}
impl Extension for Pkce {
	fn configure(&self, client: &ClientContext) -> Result<Arc<dyn Transformer>> {
		let configured = client.config().option_str(options::CODE_CHALLENGE_METHOD)?;
		let method = match (self.method, configured) {
			(Some(method), _) => Some(method),
			(None, Some(name)) => Some(PkceMethod::parse(name).ok_or_else(|| {
				ConfigError::InvalidOption {
					key: options::CODE_CHALLENGE_METHOD.into(),
					reason: format!("`{name}` is neither `S256` nor `plain`"),
				}
			})?),
			(None, None) => None,
		};

		Ok(Arc::new(Self { method }))
	}
}
impl Transformer for Pkce {
	fn on_authorization(
		&self,
		ctx: &CallContext,
		endpoint: AuthorizationEndpoint,
	) -> Result<AuthorizationEndpoint> {
		let method = self.negotiate(ctx);
		let verifier = random_urlsafe(VERIFIER_BYTES);

		ctx.store().set_as(keys::PKCE_VERIFIER, &verifier)?;

		Ok(endpoint
			.set("code_challenge", method.challenge(&verifier))
			.set("code_challenge_method", method.as_str()))
	}

	fn on_token(&self, ctx: &CallContext, endpoint: TokenEndpoint) -> Result<TokenEndpoint> {
		if endpoint.get("grant_type") != Some("authorization_code") {
			return Ok(endpoint);
		}

		match ctx.store().take_as::<String>(keys::PKCE_VERIFIER)? {
			Some(verifier) => Ok(endpoint.set("code_verifier", verifier)),
			None => Ok(endpoint),
		}
	}
}
