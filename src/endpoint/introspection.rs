//! Token introspection endpoint (RFC 7662) with an optional local resolver.

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	client::CallContext,
	endpoint::{self, EndpointFuture, Listeners, Params, ResponseListener},
	obs::{self, OperationKind},
	provider::RequestBody,
	response::IntrospectionResponse,
};

/// Answers an introspection request without the network when it can.
///
/// Returning `Ok(None)` hands the request back to the endpoint, which calls the provider
/// when it advertises an introspection endpoint and reports the token inactive otherwise.
pub trait IntrospectionResolver
where
	Self: Send + Sync,
{
	/// Resolves the request described by `params`.
	fn resolve<'a>(
		&'a self,
		ctx: &'a CallContext,
		params: &'a Params,
	) -> EndpointFuture<'a, Option<IntrospectionResponse>>;
}

/// Introspection request; `token` is mandatory.
#[derive(Clone)]
pub struct IntrospectionEndpoint {
	name: String,
	params: Params,
	listeners: Listeners<IntrospectionResponse>,
	resolver: Option<Arc<dyn IntrospectionResolver>>,
}
impl IntrospectionEndpoint {
	/// Creates an endpoint without parameters, listeners, or resolver.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Params::new(), listeners: Vec::new(), resolver: None }
	}

	/// Returns a copy with `listener` appended.
	pub fn with_listener(
		&self,
		listener: Arc<dyn ResponseListener<IntrospectionResponse>>,
	) -> Self {
		let mut next = self.clone();

		next.listeners.push(listener);

		next
	}

	/// Returns a copy that consults `resolver` before the network.
	pub fn with_resolver(&self, resolver: Arc<dyn IntrospectionResolver>) -> Self {
		let mut next = self.clone();

		next.resolver = Some(resolver);

		next
	}

	/// Whether a local resolver is attached.
	pub fn has_resolver(&self) -> bool {
		self.resolver.is_some()
	}

	/// Introspects the token, locally when possible, and runs the listeners in order.
	pub async fn call(&self, ctx: &CallContext) -> Result<IntrospectionResponse> {
		obs::observe(OperationKind::Introspection, "call", async {
			if !self.params.contains("token") {
				return Err(endpoint::missing(&self.name, "token"));
			}

			let response = match &self.resolver {
				Some(resolver) => match resolver.resolve(ctx, &self.params).await? {
					Some(local) => local,
					None if ctx.provider().supports(&self.name) => self.remote(ctx).await?,
					None => IntrospectionResponse::inactive(),
				},
				None => self.remote(ctx).await?,
			};

			endpoint::notify(&self.listeners, ctx, response).await
		})
		.await
	}

	async fn remote(&self, ctx: &CallContext) -> Result<IntrospectionResponse> {
		let provider = ctx.provider();
		let request = provider.request(
			Method::POST,
			&self.name,
			&Params::new(),
			RequestBody::Form(self.params.clone()),
		)?;
		let request = ctx.authenticate(&self.name, request)?;
		let response = provider.send_request(request).await?;

		IntrospectionResponse::from_json(response.body())
	}
}
impl PartialEq for IntrospectionEndpoint {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.params == other.params
	}
}
impl Debug for IntrospectionEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IntrospectionEndpoint")
			.field("name", &self.name)
			.field("token_type_hint", &self.params.get("token_type_hint"))
			.field("listeners", &self.listeners.len())
			.field("local", &self.resolver.is_some())
			.finish()
	}
}
super::endpoint_kind!(IntrospectionEndpoint, Introspection);
