//! Extension contracts: endpoint transformers, response listeners, and client binding.

// self
use crate::{
	_prelude::*,
	client::{CallContext, ClientContext},
	endpoint::{
		AuthorizationEndpoint, EndpointFuture, GenericEndpoint, IntrospectionEndpoint,
		RevocationEndpoint, TokenEndpoint, UserinfoEndpoint,
	},
};

/// Rewrites endpoints before they are used.
///
/// One hook exists per endpoint kind and each returns an endpoint of the kind it received.
/// Hooks default to returning the endpoint unchanged, so a transformer only overrides the
/// kinds it cares about. Registered transformers run in registration order.
pub trait Transformer
where
	Self: Send + Sync,
{
	/// Rewrites the authorization request.
	fn on_authorization(
		&self,
		_ctx: &CallContext,
		endpoint: AuthorizationEndpoint,
	) -> Result<AuthorizationEndpoint> {
		Ok(endpoint)
	}

	/// Rewrites a token request.
	fn on_token(&self, _ctx: &CallContext, endpoint: TokenEndpoint) -> Result<TokenEndpoint> {
		Ok(endpoint)
	}

	/// Rewrites a revocation request.
	fn on_revocation(
		&self,
		_ctx: &CallContext,
		endpoint: RevocationEndpoint,
	) -> Result<RevocationEndpoint> {
		Ok(endpoint)
	}

	/// Rewrites an introspection request.
	fn on_introspection(
		&self,
		_ctx: &CallContext,
		endpoint: IntrospectionEndpoint,
	) -> Result<IntrospectionEndpoint> {
		Ok(endpoint)
	}

	/// Rewrites a userinfo request.
	fn on_userinfo(
		&self,
		_ctx: &CallContext,
		endpoint: UserinfoEndpoint,
	) -> Result<UserinfoEndpoint> {
		Ok(endpoint)
	}

	/// Rewrites a generic endpoint.
	fn on_generic(&self, _ctx: &CallContext, endpoint: GenericEndpoint) -> Result<GenericEndpoint> {
		Ok(endpoint)
	}
}

/// Observes, and may replace or reject, the response of a callable endpoint.
pub trait ResponseListener<R>
where
	Self: Send + Sync,
{
	/// Receives the response and returns the value handed to the next listener.
	fn on_response<'a>(&'a self, ctx: &'a CallContext, response: R) -> EndpointFuture<'a, R>;
}

/// Unbound extension that produces a client-specific transformer.
///
/// `configure` runs once per client when the extension is registered; the returned
/// transformer belongs to that client alone.
pub trait Extension {
	/// Binds the extension to `client`.
	fn configure(&self, client: &ClientContext) -> Result<Arc<dyn Transformer>>;
}
