//! Client facade binding a configuration, a provider, a session store, and the endpoint
//! registry.

pub mod config;
pub mod context;

pub use config::*;
pub use context::*;

// self
use crate::{
	_prelude::*,
	endpoint::{
		AuthorizationEndpoint, Endpoint, EndpointRegistry, Extension, GenericEndpoint,
		IntrospectionEndpoint, Params, RevocationEndpoint, TokenEndpoint, Transformer,
		UserinfoEndpoint,
	},
	ext::OpenIdConnect,
	provider::{Provider, ProviderSource},
	store::SessionStore,
};

/// Endpoint name of RP-initiated logout, registered as a generic `GET` endpoint.
pub const END_SESSION: &str = "end_session";

/// OAuth 2.0 / OpenID Connect client.
///
/// Every client starts with the authorization, token, revocation, introspection, userinfo,
/// and `end_session` endpoints registered. Clients whose configuration opts into OpenID
/// Connect also get the [`OpenIdConnect`] extension, which stays dormant against
/// providers that were not discovered as OpenID capable. Further extensions are added
/// with [`register`](Self::register) and run after it, in registration order.
#[derive(Clone)]
pub struct Client {
	context: ClientContext,
	provider: ProviderSource,
	registry: EndpointRegistry,
}
impl Client {
	/// Creates a client for `provider`, eager or lazily discovered.
	pub fn new(
		config: ClientConfig,
		provider: impl Into<ProviderSource>,
		store: Arc<dyn SessionStore>,
	) -> Self {
		let context = ClientContext::new(config, store);
		let mut registry = EndpointRegistry::default();

		registry
			.add(AuthorizationEndpoint::new("authorization"))
			.add(TokenEndpoint::new("token"))
			.add(RevocationEndpoint::new("revocation"))
			.add(IntrospectionEndpoint::new("introspection"))
			.add(UserinfoEndpoint::new("userinfo"))
			.add(GenericEndpoint::new(END_SESSION));

		if context.config().openid() {
			registry.register(Arc::new(OpenIdConnect));
		}

		Self { context, provider: provider.into(), registry }
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		self.context.config()
	}

	/// Session store.
	pub fn store(&self) -> &Arc<dyn SessionStore> {
		self.context.store()
	}

	/// Endpoint registry.
	pub fn registry(&self) -> &EndpointRegistry {
		&self.registry
	}

	/// Adds or replaces an endpoint.
	pub fn with_endpoint(mut self, endpoint: impl Into<Endpoint>) -> Self {
		self.registry.add(endpoint);

		self
	}

	/// Appends an already bound transformer to the pipeline.
	pub fn with_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
		self.registry.register(transformer);

		self
	}

	/// Binds `extension` to this client and appends it to the pipeline.
	pub fn register(mut self, extension: &dyn Extension) -> Result<Self> {
		let transformer = extension.configure(&self.context)?;

		self.registry.register(transformer);

		Ok(self)
	}

	/// Resolves the provider, running discovery on first use for lazy sources.
	pub async fn provider(&self) -> Result<Arc<Provider>> {
		self.provider.resolve().await
	}

	/// Call context for the resolved provider.
	pub async fn context(&self) -> Result<CallContext> {
		Ok(self.context.with_provider(self.provider().await?))
	}

	/// Registered endpoint `name` with every transformer applied.
	pub async fn endpoint(&self, name: &str) -> Result<Endpoint> {
		let ctx = self.context().await?;

		self.registry.get(name, &ctx)
	}

	/// URI of the transformed endpoint `name`, e.g. an `end_session` logout redirect.
	pub async fn endpoint_uri(&self, name: &str, params: &Params) -> Result<Url> {
		let ctx = self.context().await?;

		self.prepare(name, params, &ctx)?.uri(&ctx)
	}

	/// Registered endpoint `name` with `params` set, then every transformer applied.
	pub(crate) fn prepare(
		&self,
		name: &str,
		params: &Params,
		ctx: &CallContext,
	) -> Result<Endpoint> {
		let endpoint = params
			.iter()
			.fold(self.registry.endpoint(name)?.clone(), |endpoint, (key, value)| {
				endpoint.set(key, value)
			});

		self.registry.transform(endpoint, ctx)
	}
}
impl Debug for Client {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Client")
			.field("context", &self.context)
			.field("registry", &self.registry)
			.finish()
	}
}
