//! Direct grants and token management calls exposed on [`Client`].

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, Secret},
	client::Client,
	endpoint::{
		GenericEndpoint, IntrospectionEndpoint, Params, RevocationEndpoint, TokenEndpoint,
		TokenTypeHint, UserinfoEndpoint,
	},
	jose::Claims,
	response::{IntrospectionResponse, TokenResponse, UserinfoResponse},
};

impl Client {
	/// `refresh_token` grant (RFC 6749 §6).
	///
	/// `scope` narrows the grant; when omitted the provider keeps the original scope. An
	/// empty `refresh_token` lets token storage supply the stored one.
	pub async fn refresh_token(
		&self,
		refresh_token: &str,
		scope: Option<&ScopeSet>,
	) -> Result<TokenResponse> {
		let mut params = Params::new().set("grant_type", "refresh_token");

		if !refresh_token.is_empty() {
			params = params.set("refresh_token", refresh_token);
		}
		if let Some(scope) = scope.filter(|scope| !scope.is_empty()) {
			params = params.set("scope", scope.normalized());
		}

		self.token(params).await
	}

	/// `client_credentials` grant (RFC 6749 §4.4); `scope` defaults to the configured scopes.
	pub async fn client_credentials(&self, scope: Option<&ScopeSet>) -> Result<TokenResponse> {
		let params = self.with_scope(Params::new().set("grant_type", "client_credentials"), scope);

		self.token(params).await
	}

	/// Resource owner password credentials grant (RFC 6749 §4.3).
	pub async fn password(
		&self,
		username: &str,
		password: &Secret,
		scope: Option<&ScopeSet>,
	) -> Result<TokenResponse> {
		let params = Params::new()
			.set("grant_type", "password")
			.set("username", username)
			.set("password", password.expose());

		self.token(self.with_scope(params, scope)).await
	}

	/// Runs the token endpoint with arbitrary parameters (custom or extension grants).
	pub async fn token(&self, params: Params) -> Result<TokenResponse> {
		let ctx = self.context().await?;
		let endpoint = TokenEndpoint::try_from(self.prepare("token", &params, &ctx)?)?;

		endpoint.call(&ctx).await
	}

	/// Revokes `token` (RFC 7009).
	///
	/// An empty `token` leaves the parameter unset so token storage can supply it.
	pub async fn revoke(&self, token: &str, hint: Option<TokenTypeHint>) -> Result<()> {
		let ctx = self.context().await?;
		let prepared = self.prepare("revocation", &token_params(token, hint), &ctx)?;
		let endpoint = RevocationEndpoint::try_from(prepared)?;

		endpoint.call(&ctx).await
	}

	/// Introspects `token` (RFC 7662), locally when an extension can.
	///
	/// An empty `token` leaves the parameter unset so token storage can supply it.
	pub async fn introspect(
		&self,
		token: &str,
		hint: Option<TokenTypeHint>,
	) -> Result<IntrospectionResponse> {
		let ctx = self.context().await?;
		let endpoint = IntrospectionEndpoint::try_from(self.prepare(
			"introspection",
			&token_params(token, hint),
			&ctx,
		)?)?;

		endpoint.call(&ctx).await
	}

	/// Fetches the userinfo claims of `access_token`.
	pub async fn userinfo(&self, access_token: &str) -> Result<UserinfoResponse> {
		let ctx = self.context().await?;
		let mut params = Params::new();

		if !access_token.is_empty() {
			params = params.set("access_token", access_token);
		}

		let endpoint = UserinfoEndpoint::try_from(self.prepare("userinfo", &params, &ctx)?)?;

		endpoint.call(&ctx).await
	}

	/// Calls the generic endpoint `name` and returns its JSON body as claims.
	pub async fn call_generic(&self, name: &str, params: &Params) -> Result<Claims> {
		let ctx = self.context().await?;
		let endpoint = GenericEndpoint::try_from(self.prepare(name, params, &ctx)?)?;

		endpoint.call(&ctx).await
	}

	fn with_scope(&self, params: Params, scope: Option<&ScopeSet>) -> Params {
		let scope = scope.unwrap_or_else(|| self.config().scopes());

		if scope.is_empty() { params } else { params.set("scope", scope.normalized()) }
	}
}

fn token_params(token: &str, hint: Option<TokenTypeHint>) -> Params {
	let mut params = Params::new();

	if !token.is_empty() {
		params = params.set("token", token);
	}
	if let Some(hint) = hint {
		params = params.set("token_type_hint", hint.as_str());
	}

	params
}
