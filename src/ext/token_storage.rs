//! Persists the last token response and reuses it in later requests.

// self
use crate::{
	_prelude::*,
	client::{CallContext, ClientContext},
	endpoint::{
		EndpointFuture, Extension, IntrospectionEndpoint, ResponseListener, RevocationEndpoint,
		TokenEndpoint, Transformer, UserinfoEndpoint,
	},
	jose::Claims,
	response::TokenResponse,
	store::{SessionStore, keys},
};

/// Token storage extension.
///
/// Every token response is written to the session store. Later requests that lack a
/// token get the stored one: revocation, introspection, and userinfo receive the access
/// token, refresh grants receive the refresh token and the previously granted scope.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokenStorage;
impl TokenStorage {
	/// Last stored token response.
	pub fn load(store: &Arc<dyn SessionStore>) -> Result<Option<TokenResponse>> {
		match store.get_as::<Claims>(keys::TOKEN_RESPONSE)? {
			Some(claims) => Ok(Some(TokenResponse::from_claims(claims)?)),
			None => Ok(None),
		}
	}

	/// Forgets the stored token response.
	pub fn clear(store: &Arc<dyn SessionStore>) -> Result<()> {
		Ok(store.remove(keys::TOKEN_RESPONSE)?)
	}
}
impl Extension for TokenStorage {
	fn configure(&self, _client: &ClientContext) -> Result<Arc<dyn Transformer>> {
		Ok(Arc::new(*self))
	}
}
impl Transformer for TokenStorage {
	fn on_token(&self, ctx: &CallContext, endpoint: TokenEndpoint) -> Result<TokenEndpoint> {
		let mut endpoint = endpoint;

		if endpoint.get("grant_type") == Some("refresh_token") {
			if let Some(stored) = Self::load(ctx.store())? {
				if let Some(refresh_token) = stored.refresh_token() {
					endpoint = endpoint.set_if_absent("refresh_token", refresh_token);
				}
				if let Some(scope) = stored.scope().filter(|scope| !scope.is_empty()) {
					endpoint = endpoint.set_if_absent("scope", scope.normalized());
				}
			}
		}

		Ok(endpoint.with_listener(Arc::new(*self)))
	}

	fn on_revocation(
		&self,
		ctx: &CallContext,
		endpoint: RevocationEndpoint,
	) -> Result<RevocationEndpoint> {
		Ok(match stored_access_token(ctx)? {
			Some(token) if !endpoint.params().contains("token") =>
				endpoint.set("token", token).set_if_absent("token_type_hint", "access_token"),
			_ => endpoint,
		})
	}

	fn on_introspection(
		&self,
		ctx: &CallContext,
		endpoint: IntrospectionEndpoint,
	) -> Result<IntrospectionEndpoint> {
		Ok(match stored_access_token(ctx)? {
			Some(token) if !endpoint.params().contains("token") =>
				endpoint.set("token", token).set_if_absent("token_type_hint", "access_token"),
			_ => endpoint,
		})
	}

	fn on_userinfo(
		&self,
		ctx: &CallContext,
		endpoint: UserinfoEndpoint,
	) -> Result<UserinfoEndpoint> {
		Ok(match stored_access_token(ctx)? {
			Some(token) => endpoint.set_if_absent("access_token", token),
			None => endpoint,
		})
	}
}
impl ResponseListener<TokenResponse> for TokenStorage {
	fn on_response<'a>(
		&'a self,
		ctx: &'a CallContext,
		response: TokenResponse,
	) -> EndpointFuture<'a, TokenResponse> {
		Box::pin(async move {
			ctx.store().set_as(keys::TOKEN_RESPONSE, response.claims())?;

			Ok(response)
		})
	}
}

fn stored_access_token(ctx: &CallContext) -> Result<Option<String>> {
	Ok(TokenStorage::load(ctx.store())?.map(|stored| stored.access_token().to_owned()))
}
