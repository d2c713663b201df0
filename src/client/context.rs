//! Per-client and per-call context handed to endpoints, transformers, and listeners.

// self
use crate::{
	_prelude::*,
	auth::ClientAuthMethod,
	client::ClientConfig,
	http::HttpRequest,
	provider::Provider,
	store::SessionStore,
};

/// What an extension sees when it is bound to a client.
#[derive(Clone)]
pub struct ClientContext {
	config: Arc<ClientConfig>,
	store: Arc<dyn SessionStore>,
}
impl ClientContext {
	/// Bundles a configuration with its session store.
	pub fn new(config: ClientConfig, store: Arc<dyn SessionStore>) -> Self {
		Self { config: Arc::new(config), store }
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Session store shared by the flow and its extensions.
	pub fn store(&self) -> &Arc<dyn SessionStore> {
		&self.store
	}

	/// Pairs the client with a resolved provider.
	pub fn with_provider(&self, provider: Arc<Provider>) -> CallContext {
		CallContext { client: self.clone(), provider }
	}
}
impl Debug for ClientContext {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientContext").field("client_id", &self.config.client_id()).finish()
	}
}

/// Context of a single endpoint call: the client plus its resolved provider.
#[derive(Clone, Debug)]
pub struct CallContext {
	client: ClientContext,
	provider: Arc<Provider>,
}
impl CallContext {
	/// Client half of the context.
	pub fn client(&self) -> &ClientContext {
		&self.client
	}

	/// Client configuration.
	pub fn config(&self) -> &ClientConfig {
		self.client.config()
	}

	/// Session store.
	pub fn store(&self) -> &Arc<dyn SessionStore> {
		self.client.store()
	}

	/// Resolved provider.
	pub fn provider(&self) -> &Arc<Provider> {
		&self.provider
	}

	/// Attaches client credentials for `endpoint` using the selected authentication method.
	pub fn authenticate(&self, endpoint: &str, request: HttpRequest) -> Result<HttpRequest> {
		let method = ClientAuthMethod::select(endpoint, self.config(), self.provider.metadata())?;

		method.apply(self.config(), request)
	}
}
