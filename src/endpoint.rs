//! Endpoint descriptions, the transformer pipeline, and the per-client registry.
//!
//! An endpoint is an immutable value: a registered name (the metadata key without the
//! `_endpoint` suffix), an ordered parameter map, and, for callable kinds, the response
//! listeners attached by extensions. The set of kinds is closed, so [`Endpoint`] is a sum
//! type and [`Endpoint::apply`] dispatches to the matching [`Transformer`] hook with an
//! exhaustive match.

pub mod authorization;
pub mod generic;
pub mod introspection;
pub mod params;
pub mod registry;
pub mod revocation;
pub mod token;
pub mod transform;
pub mod userinfo;

pub use authorization::*;
pub use generic::*;
pub use introspection::*;
pub use params::*;
pub use registry::*;
pub use revocation::*;
pub use token::*;
pub use transform::*;
pub use userinfo::*;

// self
use crate::{_prelude::*, client::CallContext, error::ConfigError};

/// Boxed future returned by response listeners and introspection resolvers.
pub type EndpointFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Closed set of endpoint kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EndpointKind {
	/// Front-channel authorization request.
	Authorization,
	/// Token endpoint.
	Token,
	/// Token revocation (RFC 7009).
	Revocation,
	/// Token introspection (RFC 7662).
	Introspection,
	/// OpenID Connect userinfo.
	Userinfo,
	/// Any other endpoint advertised in metadata.
	Generic,
}
impl EndpointKind {
	/// Stable lowercase label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Authorization => "authorization",
			Self::Token => "token",
			Self::Revocation => "revocation",
			Self::Introspection => "introspection",
			Self::Userinfo => "userinfo",
			Self::Generic => "generic",
		}
	}
}
impl Display for EndpointKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// `token_type_hint` values understood by revocation and introspection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TokenTypeHint {
	/// `access_token`.
	AccessToken,
	/// `refresh_token`.
	RefreshToken,
}
impl TokenTypeHint {
	/// Wire value.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::AccessToken => "access_token",
			Self::RefreshToken => "refresh_token",
		}
	}
}

/// Any registered endpoint.
#[derive(Clone, Debug, PartialEq)]
pub enum Endpoint {
	/// Authorization endpoint.
	Authorization(AuthorizationEndpoint),
	/// Token endpoint.
	Token(TokenEndpoint),
	/// Revocation endpoint.
	Revocation(RevocationEndpoint),
	/// Introspection endpoint.
	Introspection(IntrospectionEndpoint),
	/// Userinfo endpoint.
	Userinfo(UserinfoEndpoint),
	/// Generic endpoint.
	Generic(GenericEndpoint),
}
impl Endpoint {
	/// Kind of the wrapped endpoint.
	pub fn kind(&self) -> EndpointKind {
		match self {
			Self::Authorization(_) => EndpointKind::Authorization,
			Self::Token(_) => EndpointKind::Token,
			Self::Revocation(_) => EndpointKind::Revocation,
			Self::Introspection(_) => EndpointKind::Introspection,
			Self::Userinfo(_) => EndpointKind::Userinfo,
			Self::Generic(_) => EndpointKind::Generic,
		}
	}

	/// Registered name.
	pub fn name(&self) -> &str {
		match self {
			Self::Authorization(e) => e.name(),
			Self::Token(e) => e.name(),
			Self::Revocation(e) => e.name(),
			Self::Introspection(e) => e.name(),
			Self::Userinfo(e) => e.name(),
			Self::Generic(e) => e.name(),
		}
	}

	/// Request parameters.
	pub fn params(&self) -> &Params {
		match self {
			Self::Authorization(e) => e.params(),
			Self::Token(e) => e.params(),
			Self::Revocation(e) => e.params(),
			Self::Introspection(e) => e.params(),
			Self::Userinfo(e) => e.params(),
			Self::Generic(e) => e.params(),
		}
	}

	/// Parameter value.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.params().get(key)
	}

	/// Returns a copy with `key` set to `value`.
	pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
		match self {
			Self::Authorization(e) => Self::Authorization(e.set(key, value)),
			Self::Token(e) => Self::Token(e.set(key, value)),
			Self::Revocation(e) => Self::Revocation(e.set(key, value)),
			Self::Introspection(e) => Self::Introspection(e.set(key, value)),
			Self::Userinfo(e) => Self::Userinfo(e.set(key, value)),
			Self::Generic(e) => Self::Generic(e.set(key, value)),
		}
	}

	/// Runs the transformer hook matching this endpoint's kind.
	pub fn apply(self, transformer: &dyn Transformer, ctx: &CallContext) -> Result<Self> {
		Ok(match self {
			Self::Authorization(e) => Self::Authorization(transformer.on_authorization(ctx, e)?),
			Self::Token(e) => Self::Token(transformer.on_token(ctx, e)?),
			Self::Revocation(e) => Self::Revocation(transformer.on_revocation(ctx, e)?),
			Self::Introspection(e) => Self::Introspection(transformer.on_introspection(ctx, e)?),
			Self::Userinfo(e) => Self::Userinfo(transformer.on_userinfo(ctx, e)?),
			Self::Generic(e) => Self::Generic(transformer.on_generic(ctx, e)?),
		})
	}

	/// URI of the endpoint with its parameters as the query string.
	pub fn uri(&self, ctx: &CallContext) -> Result<Url> {
		ctx.provider().uri(self.name(), self.params())
	}
}

/// Generates the shared accessors and copy-on-write mutators of an endpoint kind, plus
/// the conversions to and from [`Endpoint`].
macro_rules! endpoint_kind {
	($ty:ident, $variant:ident) => {
		impl $ty {
			/// Registered name.
			pub fn name(&self) -> &str {
				&self.name
			}

			/// Request parameters.
			pub fn params(&self) -> &$crate::endpoint::Params {
				&self.params
			}

			/// Parameter value.
			pub fn get(&self, key: &str) -> Option<&str> {
				self.params.get(key)
			}

			/// Returns a copy with `key` set to `value`.
			pub fn set(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
				self.with_params(self.params.set(key, value))
			}

			/// Returns a copy with `key` set only when it is absent.
			pub fn set_if_absent(&self, key: impl Into<String>, value: impl Into<String>) -> Self {
				self.with_params(self.params.set_if_absent(key, value))
			}

			/// Returns a copy with every parameter of `params` set.
			pub fn merge(&self, params: &$crate::endpoint::Params) -> Self {
				self.with_params(self.params.merge(params))
			}

			/// Returns a copy without `key`.
			pub fn without(&self, key: &str) -> Self {
				self.with_params(self.params.without(key))
			}

			fn with_params(&self, params: $crate::endpoint::Params) -> Self {
				let mut next = self.clone();

				next.params = params;

				next
			}
		}
		impl From<$ty> for $crate::endpoint::Endpoint {
			fn from(value: $ty) -> Self {
				Self::$variant(value)
			}
		}
		impl TryFrom<$crate::endpoint::Endpoint> for $ty {
			type Error = $crate::error::ConfigError;

			fn try_from(value: $crate::endpoint::Endpoint) -> Result<Self, Self::Error> {
				match value {
					$crate::endpoint::Endpoint::$variant(endpoint) => Ok(endpoint),
					other => Err($crate::endpoint::kind_mismatch(
						&other,
						$crate::endpoint::EndpointKind::$variant,
					)),
				}
			}
		}
	};
}
pub(crate) use endpoint_kind;

/// Ordered response listeners carried by a callable endpoint.
pub type Listeners<R> = Vec<Arc<dyn ResponseListener<R>>>;

pub(crate) async fn notify<R>(listeners: &Listeners<R>, ctx: &CallContext, response: R) -> Result<R>
where
	R: Send,
{
	let mut response = response;

	for listener in listeners {
		response = listener.on_response(ctx, response).await?;
	}

	Ok(response)
}

pub(crate) fn missing(endpoint: &str, parameter: &'static str) -> Error {
	ConfigError::MissingParameter { endpoint: endpoint.to_owned(), parameter }.into()
}

fn kind_mismatch(endpoint: &Endpoint, expected: EndpointKind) -> ConfigError {
	ConfigError::EndpointKindMismatch {
		name: endpoint.name().to_owned(),
		expected: expected.as_str(),
		found: endpoint.kind().as_str(),
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn set_returns_a_new_endpoint() {
		let original = Endpoint::from(TokenEndpoint::new("token"));
		let updated = original.set("grant_type", "client_credentials");

		assert_eq!(updated.get("grant_type"), Some("client_credentials"));
		assert_eq!(original.get("grant_type"), None);
		assert_ne!(original, updated);
	}

	#[test]
	fn identity_is_structural() {
		let lhs = AuthorizationEndpoint::new("authorization").set("scope", "openid");
		let rhs = AuthorizationEndpoint::new("authorization").set("scope", "openid");

		assert_eq!(lhs, rhs);
		assert_ne!(lhs, rhs.set("scope", "email"));
	}

	#[test]
	fn conversions_report_kind_mismatches() {
		let endpoint = Endpoint::from(RevocationEndpoint::new("revocation"));
		let err =
			TokenEndpoint::try_from(endpoint).expect_err("Revocation is not a token endpoint.");

		assert!(matches!(
			err,
			ConfigError::EndpointKindMismatch { expected: "token", found: "revocation", .. }
		));
	}
}
