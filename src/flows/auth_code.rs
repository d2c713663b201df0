//! Authorization Code grant (RFC 6749 §4.1) with replay-safe callback handling.
//!
//! [`AuthorizationCodeFlow::authorization_uri`] persists the pending request under
//! [`keys::AUTHORIZATION_STATE`]; [`AuthorizationCodeFlow::handle_authorization_response`]
//! consumes it with an atomic `take`, so a callback can be exchanged at most once and the
//! stored state is gone whether or not the exchange succeeds.

// crates.io
use oauth2::CsrfToken;
// self
use crate::{
	_prelude::*,
	auth::constant_time_eq,
	client::{CallContext, Client},
	endpoint::{AuthorizationEndpoint, Params, TokenEndpoint},
	error::{ErrorCode, FlowError, ProtocolError, ValidationError},
	obs::{self, OperationKind},
	response::TokenResponse,
	store::keys,
};

/// Random bytes behind a generated `state` (43 base64url characters).
pub const STATE_BYTES: u32 = 32;

/// Pending authorization request kept in the session store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationState {
	/// Opaque `state` sent to the provider.
	pub state: String,
	/// Redirect URI the code is bound to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub redirect_uri: Option<String>,
	/// Every other request parameter, as sent.
	#[serde(default)]
	pub params: Params,
}

/// Position of a session in the authorization code flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStatus {
	/// No authorization request is pending.
	NotStarted,
	/// An authorization request was issued and its callback has not been handled.
	AwaitingCallback,
}

/// Authorization Code flow bound to one client session.
#[derive(Clone, Copy, Debug)]
pub struct AuthorizationCodeFlow<'a> {
	client: &'a Client,
}
impl<'a> AuthorizationCodeFlow<'a> {
	/// Binds the flow to `client`.
	pub fn new(client: &'a Client) -> Self {
		Self { client }
	}

	/// Whether a callback is expected for this session.
	pub fn status(&self) -> Result<FlowStatus> {
		Ok(match self.client.store().get(keys::AUTHORIZATION_STATE)? {
			Some(_) => FlowStatus::AwaitingCallback,
			None => FlowStatus::NotStarted,
		})
	}

	/// Pending request, if any.
	pub fn pending(&self) -> Result<Option<AuthorizationState>> {
		Ok(self.client.store().get_as(keys::AUTHORIZATION_STATE)?)
	}

	/// Builds the authorization redirect and records the pending request.
	///
	/// The request carries `response_type=code`, `client_id`, the configured scopes,
	/// `redirect_uri` when given, and `extra`. Transformers run next (PKCE and OpenID
	/// Connect add their parameters here), and a random `state` is generated last unless
	/// one was supplied.
	pub async fn authorization_uri(
		&self,
		redirect_uri: Option<&str>,
		extra: &Params,
	) -> Result<Url> {
		obs::observe(OperationKind::Authorization, "authorization_uri", async {
			let ctx = self.client.context().await?;
			let config = ctx.config();
			let mut params =
				Params::new().set("response_type", "code").set("client_id", config.client_id());

			if !config.scopes().is_empty() {
				params = params.set("scope", config.scopes().normalized());
			}
			if let Some(redirect_uri) = redirect_uri {
				params = params.set("redirect_uri", redirect_uri);
			}

			let endpoint = AuthorizationEndpoint::try_from(self.client.prepare(
				"authorization",
				&params.merge(extra),
				&ctx,
			)?)?;
			let endpoint = match endpoint.get("state") {
				Some(_) => endpoint,
				None => endpoint.set("state", CsrfToken::new_random_len(STATE_BYTES).secret()),
			};
			let pending = AuthorizationState {
				state: endpoint.get("state").unwrap_or_default().to_owned(),
				redirect_uri: endpoint.get("redirect_uri").map(ToOwned::to_owned),
				params: endpoint.params().without("state").without("redirect_uri"),
			};

			ctx.store().set_as(keys::AUTHORIZATION_STATE, &pending)?;

			endpoint.uri(&ctx)
		})
		.await
	}

	/// Validates the callback parameters and exchanges the code.
	///
	/// Fails with [`FlowError::NotStarted`] when nothing is pending,
	/// [`FlowError::InvalidState`] when `state` is missing or differs, a
	/// [`ProtocolError`] when the provider reported `error`, and
	/// [`FlowError::MissingCode`] when no code came back. When the provider advertises
	/// `authorization_response_iss_parameter_supported`, `iss` must name the provider
	/// (RFC 9207). A rejected callback also discards the stored PKCE verifier and nonce.
	pub async fn handle_authorization_response(&self, response: &Params) -> Result<TokenResponse> {
		obs::observe(OperationKind::Authorization, "handle_authorization_response", async {
			let ctx = self.client.context().await?;
			let pending = ctx.store().take_as::<AuthorizationState>(keys::AUTHORIZATION_STATE)?;
			let Some(pending) = pending else {
				return Err(FlowError::NotStarted.into());
			};

			let code = match callback_code(&ctx, &pending, response) {
				Ok(code) => code,
				Err(e) => {
					for key in [keys::PKCE_VERIFIER, keys::OIDC_NONCE] {
						ctx.store().remove(key)?;
					}

					return Err(e);
				},
			};
			let mut params =
				Params::new().set("grant_type", "authorization_code").set("code", code);

			if let Some(redirect_uri) = &pending.redirect_uri {
				params = params.set("redirect_uri", redirect_uri.as_str());
			}

			let endpoint = TokenEndpoint::try_from(self.client.prepare("token", &params, &ctx)?)?;

			endpoint.call(&ctx).await
		})
		.await
	}
}

// Validates the callback against the pending request and returns the authorization code.
fn callback_code<'r>(
	ctx: &CallContext,
	pending: &AuthorizationState,
	response: &'r Params,
) -> Result<&'r str> {
	match response.get("state") {
		Some(state) if constant_time_eq(state, &pending.state) => (),
		_ => return Err(FlowError::InvalidState.into()),
	}

	if let Some(code) = response.get("error") {
		let mut error = ProtocolError::new(ErrorCode::parse(code));

		if let Some(description) = response.get("error_description") {
			error = error.with_description(description);
		}
		if let Some(uri) = response.get("error_uri") {
			error = error.with_uri(uri);
		}

		return Err(error.into());
	}

	let provider = ctx.provider();

	if provider.metadata().flag("authorization_response_iss_parameter_supported") {
		let found = response.get("iss").unwrap_or_default();

		if found != provider.issuer() {
			return Err(ValidationError::ClaimMismatch {
				claim: "iss",
				expected: provider.issuer().to_owned(),
				found: found.to_owned(),
			}
			.into());
		}
	}

	response.get("code").ok_or_else(|| FlowError::MissingCode.into())
}

impl Client {
	/// Authorization Code flow for this client's session.
	pub fn authorization_code(&self) -> AuthorizationCodeFlow<'_> {
		AuthorizationCodeFlow::new(self)
	}
}
