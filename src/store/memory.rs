//! Thread-safe in-memory stores for local development and tests.

// self
use crate::{
	_prelude::*,
	provider::CachedProviderConfig,
	store::{ConfigCache, SessionStore, StoreError, StoreFuture},
};

/// Session store that keeps values in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<Mutex<HashMap<String, Value>>>);
impl MemoryStore {
	/// Number of stored entries.
	pub fn len(&self) -> usize {
		self.0.lock().len()
	}

	/// Returns true when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.lock().is_empty()
	}

	/// Returns true when `key` holds a value.
	pub fn contains(&self, key: &str) -> bool {
		self.0.lock().contains_key(key)
	}
}
impl SessionStore for MemoryStore {
	fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		Ok(self.0.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
		self.0.lock().insert(key.to_owned(), value);

		Ok(())
	}

	fn take(&self, key: &str) -> Result<Option<Value>, StoreError> {
		Ok(self.0.lock().remove(key))
	}
}

/// Provider configuration cache that lives as long as the process.
#[derive(Clone, Debug, Default)]
pub struct MemoryConfigCache(Arc<RwLock<HashMap<String, CachedProviderConfig>>>);
impl ConfigCache for MemoryConfigCache {
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CachedProviderConfig>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(key).cloned()) })
	}

	fn save<'a>(&'a self, key: &'a str, entry: CachedProviderConfig) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(key.to_owned(), entry);

			Ok(())
		})
	}

	fn evict<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(key);

			Ok(())
		})
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn take_consumes_exactly_once() {
		let store = MemoryStore::default();

		store.set("verifier", Value::String("abc".into())).expect("Value should be stored.");

		assert_eq!(store.take("verifier").expect("Take should succeed."), Some("abc".into()));
		assert_eq!(store.take("verifier").expect("Take should succeed."), None);
		assert!(store.is_empty());
	}

	#[tokio::test]
	async fn config_cache_round_trips() {
		let cache = MemoryConfigCache::default();
		let entry = CachedProviderConfig {
			url: "https://issuer.example.com".into(),
			config: Map::new(),
			openid: true,
		};

		cache.save("k", entry.clone()).await.expect("Entry should be saved.");

		assert_eq!(cache.load("k").await.expect("Entry should load."), Some(entry));

		cache.evict("k").await.expect("Entry should be evicted.");

		assert_eq!(cache.load("k").await.expect("Load should succeed."), None);
	}
}
