//! Well-known document discovery with a URL-hash keyed configuration cache.

// crates.io
use oauth2::http::Method;
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	error::ConfigError,
	http::HttpTransport,
	obs::{self, OperationKind},
	provider::{Provider, ProviderMetadata, RequestBody, build_request},
	response,
	store::{ConfigCache, MemoryConfigCache},
};

/// Well-known paths tried in order, with the OpenID capability each one implies.
pub const WELL_KNOWN_PATHS: [(&str, bool); 2] =
	[("openid-configuration", true), ("oauth-authorization-server", false)];

/// Cached discovery result.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CachedProviderConfig {
	/// Base URL the document was discovered from.
	pub url: String,
	/// Raw metadata document.
	pub config: Map<String, Value>,
	/// Whether the OpenID Connect document answered.
	pub openid: bool,
}

/// Resolves base URLs into [`Provider`] values.
///
/// Concurrent discoveries of the same URL are serialized so only the first caller hits the
/// network; later callers find the cache entry it wrote.
pub struct Discovery {
	http: Arc<dyn HttpTransport>,
	cache: Arc<dyn ConfigCache>,
	guards: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}
impl Discovery {
	/// Creates a discovery service backed by an in-memory cache.
	pub fn new(http: Arc<dyn HttpTransport>) -> Self {
		Self { http, cache: Arc::new(MemoryConfigCache::default()), guards: Default::default() }
	}

	/// Replaces the configuration cache.
	pub fn with_cache(mut self, cache: Arc<dyn ConfigCache>) -> Self {
		self.cache = cache;

		self
	}

	/// Cache key for `base_url`: lowercase hex SHA-256 of the URL string.
	pub fn cache_key(base_url: &str) -> String {
		Sha256::digest(base_url.as_bytes()).iter().map(|byte| format!("{byte:02x}")).collect()
	}

	/// Discovers (or loads from cache) the provider at `base_url`.
	pub async fn discover(&self, base_url: &str) -> Result<Arc<Provider>> {
		obs::observe(OperationKind::Discovery, "discover", async {
			let config = self.resolve(base_url).await?;
			let metadata = ProviderMetadata::from_map(config.config)?;

			Ok(Arc::new(Provider::new(metadata, self.http.clone()).with_openid(config.openid)))
		})
		.await
	}

	/// Returns a provider that discovers `base_url` on first use.
	pub fn lazy(self: &Arc<Self>, base_url: impl Into<String>) -> LazyProvider {
		LazyProvider {
			discovery: self.clone(),
			base_url: base_url.into(),
			cell: AsyncOnceCell::new(),
		}
	}

	/// Fetches the well-known documents for `base_url`, bypassing the cache.
	pub async fn fetch(&self, base_url: &str) -> Result<CachedProviderConfig> {
		let base = base_url.trim_end_matches('/');

		for (path, openid) in WELL_KNOWN_PATHS {
			let raw = format!("{base}/.well-known/{path}");
			let url = Url::parse(&raw).map_err(|e| ConfigError::invalid_url(&raw, e))?;
			let request = build_request(Method::GET, &url, RequestBody::Empty)?;
			let response = self.http.execute(request).await?;

			if response.status().as_u16() != 200 {
				#[cfg(feature = "tracing")]
				tracing::debug!(
					url = %url,
					status = response.status().as_u16(),
					"well-known document unavailable"
				);

				continue;
			}

			let config: Map<String, Value> = match response::parse_json("discovery", response.body())
			{
				Ok(config) => config,
				Err(_e) => {
					#[cfg(feature = "tracing")]
					tracing::debug!(url = %url, error = %_e, "well-known document is not JSON");

					continue;
				},
			};

			ProviderMetadata::from_map(config.clone())?;

			return Ok(CachedProviderConfig { url: base_url.to_owned(), config, openid });
		}

		Err(Error::unsupported(format!("discovery of {base_url}")))
	}

	/// Drops the cached entry for `base_url`.
	pub async fn invalidate(&self, base_url: &str) -> Result<()> {
		Ok(self.cache.evict(&Self::cache_key(base_url)).await?)
	}

	async fn resolve(&self, base_url: &str) -> Result<CachedProviderConfig> {
		let key = Self::cache_key(base_url);

		if let Some(hit) = self.cache.load(&key).await? {
			return Ok(hit);
		}

		let guard = self.guard(&key);
		let result = {
			let _lock = guard.lock().await;

			self.resolve_locked(base_url, &key).await
		};

		self.release(&key, guard);

		result
	}

	async fn resolve_locked(&self, base_url: &str, key: &str) -> Result<CachedProviderConfig> {
		if let Some(hit) = self.cache.load(key).await? {
			return Ok(hit);
		}

		let config = self.fetch(base_url).await?;

		self.cache.save(key, config.clone()).await?;

		Ok(config)
	}

	fn guard(&self, key: &str) -> Arc<AsyncMutex<()>> {
		let mut guards = self.guards.lock();

		guards.entry(key.to_owned()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	// Drops the map entry once no other caller holds or waits on it.
	fn release(&self, key: &str, guard: Arc<AsyncMutex<()>>) {
		let mut guards = self.guards.lock();

		if Arc::strong_count(&guard) == 2 {
			guards.remove(key);
		}
	}
}
impl Debug for Discovery {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Discovery").field("in_flight", &self.guards.lock().len()).finish()
	}
}

/// Provider whose discovery is deferred until first use, then memoized.
pub struct LazyProvider {
	discovery: Arc<Discovery>,
	base_url: String,
	cell: AsyncOnceCell<Arc<Provider>>,
}
impl LazyProvider {
	/// Base URL that will be discovered.
	pub fn base_url(&self) -> &str {
		&self.base_url
	}

	/// Returns true once discovery has completed.
	pub fn is_resolved(&self) -> bool {
		self.cell.is_initialized()
	}

	/// Discovers the provider on first call and returns the memoized value afterwards.
	pub async fn get(&self) -> Result<Arc<Provider>> {
		self.cell.get_or_try_init(|| self.discovery.discover(&self.base_url)).await.cloned()
	}
}
impl Debug for LazyProvider {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LazyProvider")
			.field("base_url", &self.base_url)
			.field("resolved", &self.is_resolved())
			.finish()
	}
}

/// Where a client obtains its provider from.
#[derive(Clone, Debug)]
pub enum ProviderSource {
	/// Provider configured up front.
	Ready(Arc<Provider>),
	/// Provider discovered on first use.
	Lazy(Arc<LazyProvider>),
}
impl ProviderSource {
	/// Returns the provider, running discovery if needed.
	pub async fn resolve(&self) -> Result<Arc<Provider>> {
		match self {
			Self::Ready(provider) => Ok(provider.clone()),
			Self::Lazy(lazy) => lazy.get().await,
		}
	}
}
impl From<Arc<Provider>> for ProviderSource {
	fn from(value: Arc<Provider>) -> Self {
		Self::Ready(value)
	}
}
impl From<Provider> for ProviderSource {
	fn from(value: Provider) -> Self {
		Self::Ready(Arc::new(value))
	}
}
impl From<LazyProvider> for ProviderSource {
	fn from(value: LazyProvider) -> Self {
		Self::Lazy(Arc::new(value))
	}
}
impl From<Arc<LazyProvider>> for ProviderSource {
	fn from(value: Arc<LazyProvider>) -> Self {
		Self::Lazy(value)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::{HttpFuture, HttpRequest, HttpResponse};

	struct Document(&'static str);
	impl HttpTransport for Document {
		fn execute(&self, _request: HttpRequest) -> HttpFuture<'_> {
			let body = self.0.as_bytes().to_vec();

			Box::pin(async move { Ok(HttpResponse::new(body)) })
		}
	}

	#[tokio::test]
	async fn finished_discoveries_release_their_guards() {
		let service = Discovery::new(Arc::new(Document(
			r#"{"issuer":"https://issuer.example.com","token_endpoint":"https://issuer.example.com/token"}"#,
		)));
		let (first, second) = tokio::join!(
			service.discover("https://a.example.com"),
			service.discover("https://b.example.com"),
		);

		first.expect("First discovery should succeed.");
		second.expect("Second discovery should succeed.");
		assert_eq!(service.guards.lock().len(), 0);

		let failing = Discovery::new(Arc::new(Document("<html>app shell</html>")));
		let err = failing
			.discover("https://c.example.com")
			.await
			.expect_err("HTML documents are not metadata.");

		assert!(matches!(err, Error::Unsupported { .. }));
		assert_eq!(failing.guards.lock().len(), 0);
	}

	#[test]
	fn cache_keys_are_sha256_hex() {
		let key = Discovery::cache_key("https://issuer.example.com");

		assert_eq!(key, "605ec2f11533f3f2274ec7d304db418b49f991bba3c7d27b1d2a1e4e1575c678");
		assert_ne!(key, Discovery::cache_key("https://issuer.example.com/"));
	}
}
