//! Endpoints outside the core protocol set (`end_session`, device authorization, ...).

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	client::CallContext,
	endpoint::{Listeners, Params, ResponseListener, notify},
	jose::Claims,
	obs::{self, OperationKind},
	provider::RequestBody,
	response,
};

/// Endpoint advertised as `{name}_endpoint` with no dedicated semantics.
///
/// `GET` endpoints send their parameters in the query string, anything else as a form
/// body. Responses are decoded as JSON claims; an empty body yields empty claims.
#[derive(Clone)]
pub struct GenericEndpoint {
	name: String,
	method: Method,
	params: Params,
	listeners: Listeners<Claims>,
}
impl GenericEndpoint {
	/// Creates a `GET` endpoint.
	pub fn new(name: impl Into<String>) -> Self {
		Self::with_method(name, Method::GET)
	}

	/// Creates an endpoint using `method`.
	pub fn with_method(name: impl Into<String>, method: Method) -> Self {
		Self { name: name.into(), method, params: Params::new(), listeners: Vec::new() }
	}

	/// HTTP method.
	pub fn method(&self) -> &Method {
		&self.method
	}

	/// Returns a copy with `listener` appended.
	pub fn with_listener(&self, listener: Arc<dyn ResponseListener<Claims>>) -> Self {
		let mut next = self.clone();

		next.listeners.push(listener);

		next
	}

	/// URI with every parameter in the query string, for front-channel redirects.
	pub fn uri(&self, ctx: &CallContext) -> Result<Url> {
		ctx.provider().uri(&self.name, &self.params)
	}

	/// Performs the round trip and runs the listeners in order.
	pub async fn call(&self, ctx: &CallContext) -> Result<Claims> {
		obs::observe(OperationKind::Generic, "call", async {
			let provider = ctx.provider();
			let request = if self.method == Method::GET {
				provider.request(Method::GET, &self.name, &self.params, RequestBody::Empty)?
			} else {
				provider.request(
					self.method.clone(),
					&self.name,
					&Params::new(),
					RequestBody::Form(self.params.clone()),
				)?
			};
			let response = provider.send_request(request).await?;
			let claims = if response.body().iter().all(u8::is_ascii_whitespace) {
				Claims::new()
			} else {
				response::parse_json("generic", response.body())?
			};

			notify(&self.listeners, ctx, claims).await
		})
		.await
	}
}
impl PartialEq for GenericEndpoint {
	fn eq(&self, other: &Self) -> bool {
		self.name == other.name && self.method == other.method && self.params == other.params
	}
}
impl Debug for GenericEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("GenericEndpoint")
			.field("name", &self.name)
			.field("method", &self.method)
			.field("params", &self.params)
			.field("listeners", &self.listeners.len())
			.finish()
	}
}
super::endpoint_kind!(GenericEndpoint, Generic);
