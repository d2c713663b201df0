//! Token revocation endpoint (RFC 7009).

// crates.io
use oauth2::http::Method;
// self
use crate::{
	_prelude::*,
	client::CallContext,
	endpoint::{self, Params},
	obs::{self, OperationKind},
	provider::RequestBody,
};

/// Revocation request; `token` is mandatory.
#[derive(Clone, PartialEq, Eq)]
pub struct RevocationEndpoint {
	name: String,
	params: Params,
}
impl RevocationEndpoint {
	/// Creates an endpoint without parameters.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Params::new() }
	}

	/// Posts the revocation form. Any 2xx response counts as success; the body is ignored.
	pub async fn call(&self, ctx: &CallContext) -> Result<()> {
		obs::observe(OperationKind::Revocation, "call", async {
			if !self.params.contains("token") {
				return Err(endpoint::missing(&self.name, "token"));
			}

			let provider = ctx.provider();
			let request = provider.request(
				Method::POST,
				&self.name,
				&Params::new(),
				RequestBody::Form(self.params.clone()),
			)?;
			let request = ctx.authenticate(&self.name, request)?;

			provider.send_request(request).await.map(|_| ())
		})
		.await
	}
}
impl Debug for RevocationEndpoint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RevocationEndpoint")
			.field("name", &self.name)
			.field("token_type_hint", &self.params.get("token_type_hint"))
			.finish()
	}
}
super::endpoint_kind!(RevocationEndpoint, Revocation);
