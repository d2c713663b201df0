//! Rejects requested scopes outside an allow-list.

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	client::{CallContext, ClientContext, options},
	endpoint::{AuthorizationEndpoint, Extension, TokenEndpoint, Transformer},
	error::ValidationError,
};

/// Scope enforcement extension.
///
/// The allow-list comes from the `allowed_scopes` client option, falling back to the
/// provider's `scopes_supported`. Without either, every scope passes.
#[derive(Clone, Debug, Default)]
pub struct ScopeValidation {
	allowed: Option<ScopeSet>,
}
impl ScopeValidation {
	/// Uses the client option or provider metadata.
	pub fn new() -> Self {
		Self::default()
	}

	/// Uses `allowed` regardless of options and metadata.
	pub fn with_allowed(mut self, allowed: ScopeSet) -> Self {
		self.allowed = Some(allowed);

		self
	}

	/// Checks `requested` against the allow-list in effect for `ctx`.
	pub fn check(&self, ctx: &CallContext, requested: &str) -> Result<(), ValidationError> {
		let allowed = match &self.allowed {
			Some(allowed) => allowed.clone(),
			None => {
				let supported = ctx.provider().metadata().strings("scopes_supported");

				if supported.is_empty() {
					return Ok(());
				}

				ScopeSet::parse(&supported.join(" "))
			},
		};

		match ScopeSet::parse(requested).difference(&allowed).next() {
			Some(scope) => Err(ValidationError::InvalidScope { scope: scope.to_owned() }),
			None => Ok(()),
		}
	}
}
impl Extension for ScopeValidation {
	fn configure(&self, client: &ClientContext) -> Result<Arc<dyn Transformer>> {
		let allowed = match &self.allowed {
			Some(allowed) => Some(allowed.clone()),
			None => client.config().option_scopes(options::ALLOWED_SCOPES)?,
		};

		Ok(Arc::new(Self { allowed }))
	}
}
impl Transformer for ScopeValidation {
	fn on_authorization(
		&self,
		ctx: &CallContext,
		endpoint: AuthorizationEndpoint,
	) -> Result<AuthorizationEndpoint> {
		if let Some(scope) = endpoint.get("scope") {
			self.check(ctx, scope)?;
		}

		Ok(endpoint)
	}

	fn on_token(&self, ctx: &CallContext, endpoint: TokenEndpoint) -> Result<TokenEndpoint> {
		if let Some(scope) = endpoint.get("scope") {
			self.check(ctx, scope)?;
		}

		Ok(endpoint)
	}
}
