//! Per-client endpoint table and the ordered transformer list.

// self
use crate::{
	_prelude::*,
	client::CallContext,
	endpoint::{Endpoint, Transformer},
	error::ConfigError,
};

/// Endpoints registered for one client, plus the transformers applied to them.
///
/// Registration happens while the client is being built; afterwards the registry is only
/// read. [`get`](Self::get) folds every transformer over the stored endpoint in the
/// order they were registered, so later transformers observe earlier rewrites.
#[derive(Clone, Default)]
pub struct EndpointRegistry {
	endpoints: HashMap<String, Endpoint>,
	transformers: Vec<Arc<dyn Transformer>>,
}
impl EndpointRegistry {
	/// Stores `endpoint` under its name, replacing any previous registration.
	pub fn add(&mut self, endpoint: impl Into<Endpoint>) -> &mut Self {
		let endpoint = endpoint.into();

		self.endpoints.insert(endpoint.name().to_owned(), endpoint);

		self
	}

	/// Appends `transformer` to the pipeline.
	pub fn register(&mut self, transformer: Arc<dyn Transformer>) -> &mut Self {
		self.transformers.push(transformer);

		self
	}

	/// Returns true when `name` is registered.
	pub fn contains(&self, name: &str) -> bool {
		self.endpoints.contains_key(name)
	}

	/// Number of registered transformers.
	pub fn transformer_count(&self) -> usize {
		self.transformers.len()
	}

	/// Registered endpoint before any transformer ran.
	pub fn endpoint(&self, name: &str) -> Result<&Endpoint, ConfigError> {
		self.endpoints
			.get(name)
			.ok_or_else(|| ConfigError::UnknownEndpoint { name: name.to_owned() })
	}

	/// Registered endpoint with every transformer applied.
	pub fn get(&self, name: &str, ctx: &CallContext) -> Result<Endpoint> {
		self.transform(self.endpoint(name)?.clone(), ctx)
	}

	/// Like [`get`](Self::get), converted to a concrete endpoint kind.
	pub fn get_as<E>(&self, name: &str, ctx: &CallContext) -> Result<E>
	where
		E: TryFrom<Endpoint, Error = ConfigError>,
	{
		Ok(E::try_from(self.get(name, ctx)?)?)
	}

	/// Applies every transformer, in registration order, to an arbitrary endpoint.
	pub fn transform(&self, endpoint: Endpoint, ctx: &CallContext) -> Result<Endpoint> {
		self.transformers.iter().try_fold(endpoint, |endpoint, transformer| {
			endpoint.apply(transformer.as_ref(), ctx)
		})
	}

	/// URI of the transformed endpoint `name`, parameters in the query string.
	pub fn uri(&self, name: &str, ctx: &CallContext) -> Result<Url> {
		self.get(name, ctx)?.uri(ctx)
	}
}
impl Debug for EndpointRegistry {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		let mut names = self.endpoints.keys().collect::<Vec<_>>();

		names.sort();

		f.debug_struct("EndpointRegistry")
			.field("endpoints", &names)
			.field("transformers", &self.transformers.len())
			.finish()
	}
}
