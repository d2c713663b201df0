//! Front-channel authorization endpoint.

// self
use crate::{_prelude::*, client::CallContext, endpoint::Params};

/// Authorization request; never called directly, only rendered into a redirect URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationEndpoint {
	name: String,
	params: Params,
}
impl AuthorizationEndpoint {
	/// Creates an endpoint without parameters.
	pub fn new(name: impl Into<String>) -> Self {
		Self { name: name.into(), params: Params::new() }
	}

	/// Redirect URI carrying every parameter in the query string.
	pub fn uri(&self, ctx: &CallContext) -> Result<Url> {
		ctx.provider().uri(&self.name, &self.params)
	}
}
super::endpoint_kind!(AuthorizationEndpoint, Authorization);
