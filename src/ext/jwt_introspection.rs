//! Local introspection of JWT access tokens (RFC 9068 style).

// self
use crate::{
	_prelude::*,
	client::{CallContext, ClientContext},
	endpoint::{
		EndpointFuture, Extension, IntrospectionEndpoint, IntrospectionResolver, Params,
		TokenTypeHint, Transformer,
	},
	jose::Claims,
	response::IntrospectionResponse,
};

/// Answers introspection requests for JWT access tokens by verifying them locally.
///
/// Refresh-token hints and tokens that fail to verify are handed back to the endpoint,
/// which falls back to the provider's introspection endpoint when advertised and reports
/// the token inactive otherwise.
#[derive(Clone, Copy, Debug, Default)]
pub struct JwtIntrospection;
impl JwtIntrospection {
	/// Derives an RFC 7662 response from verified access token claims.
	///
	/// `active` requires an unexpired token that is already valid and was issued by
	/// `issuer`. `token_type` defaults to `bearer` and `client_id` to the first audience.
	pub fn derive(claims: &Claims, issuer: &str, now: OffsetDateTime) -> IntrospectionResponse {
		let expired = claims.is_past("exp", now).unwrap_or(false);
		let premature = claims.i64("nbf").is_some_and(|nbf| nbf > now.unix_timestamp());
		let active = !expired && !premature && claims.str("iss") == Some(issuer);
		let mut derived = claims.with("active", active);

		if !derived.contains("token_type") {
			derived = derived.with("token_type", "bearer");
		}
		if !derived.contains("client_id") {
			if let Some(audience) = claims.audience().first() {
				derived = derived.with("client_id", *audience);
			}
		}

		IntrospectionResponse::from_claims(derived)
	}
}
impl Extension for JwtIntrospection {
	fn configure(&self, _client: &ClientContext) -> Result<Arc<dyn Transformer>> {
		Ok(Arc::new(*self))
	}
}
impl Transformer for JwtIntrospection {
	fn on_introspection(
		&self,
		_ctx: &CallContext,
		endpoint: IntrospectionEndpoint,
	) -> Result<IntrospectionEndpoint> {
		Ok(endpoint.with_resolver(Arc::new(*self)))
	}
}
impl IntrospectionResolver for JwtIntrospection {
	fn resolve<'a>(
		&'a self,
		ctx: &'a CallContext,
		params: &'a Params,
	) -> EndpointFuture<'a, Option<IntrospectionResponse>> {
		Box::pin(async move {
			let access_token_hint = TokenTypeHint::AccessToken.as_str();

			if params.get("token_type_hint").is_some_and(|hint| hint != access_token_hint) {
				return Ok(None);
			}

			let Some(token) = params.get("token") else {
				return Ok(None);
			};
			let provider = ctx.provider();
			let keys = match provider.key_set().await {
				Ok(keys) => keys,
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(error = %_e, "provider keys are unavailable");

					return Ok(None);
				},
			};
			let jwt = match provider.codec().decode(token, keys) {
				Ok(jwt) => jwt,
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(error = %_e, "access token is not a verifiable JWT");

					return Ok(None);
				},
			};

			Ok(Some(Self::derive(jwt.claims(), provider.issuer(), OffsetDateTime::now_utc())))
		})
	}
}
