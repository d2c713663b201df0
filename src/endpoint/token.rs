//! Token endpoint (RFC 6749 §3.2).

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	client::CallContext,
	endpoint::{self, Listeners, Params, ResponseListener},
	obs::{self, OperationKind},
	provider::RequestBody,
	response::TokenResponse,
};

/// Token request. `grant_type` is mandatory when the endpoint is called.
#[derive(Clone)]
pub struct TokenEndpoint {
	name: String,
	params: Params,
	listeners: Listeners<TokenResponse>,
}
impl TokenEndpoint {
	/// Creates an endpoint without parameters or listeners.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Params::new(), listeners: Vec::new() }
	}

	/// Returns a copy with `listener` appended.
	pub fn with_listener(&self, listener: Arc<dyn ResponseListener<TokenResponse>>) -> Self {
		let mut next = self.clone();

		next.listeners.push(listener);

		next
	}

	/// Number of attached listeners.
	pub fn listener_count(&self) -> usize {
		self.listeners.len()
	}

	/// Posts the form, authenticating the client, and runs the listeners in order.
	pub async fn call(&self, ctx: &CallContext) -> Result<TokenResponse> {
		obs::observe(OperationKind::Token, "call", async {
			if !self.params.contains("grant_type") {
				return Err(endpoint::missing(&self.name, "grant_type"));
			}

			let provider = ctx.provider();
			let request = provider.request(
				Method::POST,
				&self.name,
				&Params::new(),
				RequestBody::Form(self.params.clone()),
			)?;
			let request = ctx.authenticate(&self.name, request)?;
			let response = provider.send_request(request).await?;
			let token = TokenResponse::from_json(response.body())?;

			endpoint::notify(&self.listeners, ctx, token).await
		})
		.await
	}
}
impl PartialEq for TokenEndpoint {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.params == other.params
	}
}
impl Debug for TokenEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenEndpoint")
			.field("name", &self.name)
			.field("params", &self.params.iter().map(|(key, _)| key).collect::<Vec<_>>())
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
super::endpoint_kind!(TokenEndpoint, Token);
