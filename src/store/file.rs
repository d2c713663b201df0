//! File-backed stores for lightweight deployments and CLIs.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	provider::CachedProviderConfig,
	store::{ConfigCache, SessionStore, StoreError, StoreFuture},
};

/// Session store persisted to a single JSON object after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<Mutex<Map<String, Value>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		ensure_parent_exists(&path)?;

		let snapshot = match read_optional(&path)? {
			Some(bytes) if !bytes.is_empty() =>
				serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
					message: format!("Failed to parse {}: {e}", path.display()),
				})?,
			_ => Map::new(),
		};

		Ok(Self { path, inner: Arc::new(Mutex::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}
}
impl SessionStore for FileStore {
	fn get(&self, key: &str) -> Result<Option<Value>, StoreError> {
		Ok(self.inner.lock().get(key).cloned())
	}

	fn set(&self, key: &str, value: Value) -> Result<(), StoreError> {
		let mut guard = self.inner.lock();

		guard.insert(key.to_owned(), value);
		write_atomically(&self.path, &serialize(&*guard)?)
	}

	fn take(&self, key: &str) -> Result<Option<Value>, StoreError> {
		let mut guard = self.inner.lock();
		let taken = guard.remove(key);

		if taken.is_some() {
			write_atomically(&self.path, &serialize(&*guard)?)?;
		}

		Ok(taken)
	}
}

/// Provider configuration cache storing one `{key}.json` file per discovered URL.
#[derive(Clone, Debug)]
pub struct FileConfigCache {
	dir: PathBuf,
}
impl FileConfigCache {
	/// Uses (and creates if needed) `dir` as the cache directory.
	pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let dir = dir.into();

		fs::create_dir_all(&dir).map_err(|e| StoreError::Backend {
			message: format!("Failed to create cache directory {}: {e}", dir.display()),
		})?;

		Ok(Self { dir })
	}

	fn entry_path(&self, key: &str) -> Result<PathBuf, StoreError> {
		let file_safe = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_';

		if key.is_empty() || !key.chars().all(file_safe) {
			return Err(StoreError::Backend {
				message: format!("Cache key `{key}` is not file safe"),
			});
		}

		Ok(self.dir.join(format!("{key}.json")))
	}
}
impl ConfigCache for FileConfigCache {
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CachedProviderConfig>> {
		Box::pin(async move {
			let path = self.entry_path(key)?;
			let Some(bytes) = read_optional(&path)? else {
				return Ok(None);
			};

			serde_json::from_slice(&bytes).map(Some).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})
		})
	}

	fn save<'a>(&'a self, key: &'a str, entry: CachedProviderConfig) -> StoreFuture<'a, ()> {
		Box::pin(async move { write_atomically(&self.entry_path(key)?, &serialize(&entry)?) })
	}

	fn evict<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let path = self.entry_path(key)?;

			match fs::remove_file(&path) {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Backend {
					message: format!("Failed to remove {}: {e}", path.display()),
				}),
			}
		})
	}
}

fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
	if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
		fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
			message: format!("Failed to create store directory {}: {e}", parent.display()),
		})?;
	}

	Ok(())
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>, StoreError> {
	match fs::read(path) {
		Ok(bytes) => Ok(Some(bytes)),
		Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
		Err(e) => Err(StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		}),
	}
}

fn serialize<T>(value: &T) -> Result<Vec<u8>, StoreError>
where
	T: Serialize,
{
	serde_json::to_vec_pretty(value).map_err(|e| StoreError::Serialization {
		message: format!("Failed to serialize store snapshot: {e}"),
	})
}

fn write_atomically(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
	ensure_parent_exists(path)?;

	let mut tmp_path = path.to_path_buf();

	tmp_path.set_extension("tmp");

	{
		let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
			message: format!("Failed to create {}: {e}", tmp_path.display()),
		})?;

		file.write_all(bytes).map_err(|e| StoreError::Backend {
			message: format!("Failed to write {}: {e}", tmp_path.display()),
		})?;
		file.sync_all().map_err(|e| StoreError::Backend {
			message: format!("Failed to sync {}: {e}", tmp_path.display()),
		})?;
	}

	fs::rename(&tmp_path, path).map_err(|e| StoreError::Backend {
		message: format!("Failed to replace {}: {e}", path.display()),
	})
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// self
	use super::*;

	fn temp_path(label: &str) -> PathBuf {
		let unique = format!(
			"oidc_engine_{label}_{}_{}",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	#[test]
	fn session_values_survive_reopen() {
		let path = temp_path("session").with_extension("json");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");

		store.set("nonce", Value::String("n-1".into())).expect("Failed to store nonce.");
		store.set("verifier", Value::String("v-1".into())).expect("Failed to store verifier.");
		store.take("verifier").expect("Failed to take verifier.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");

		assert_eq!(reopened.get("nonce").expect("Read should succeed."), Some("n-1".into()));
		assert_eq!(reopened.get("verifier").expect("Read should succeed."), None);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[tokio::test]
	async fn config_cache_writes_one_file_per_key() {
		let dir = temp_path("cache");
		let cache = FileConfigCache::open(&dir).expect("Failed to open cache directory.");
		let entry = CachedProviderConfig {
			url: "https://issuer.example.com".into(),
			config: Map::new(),
			openid: false,
		};

		cache.save("abc123", entry.clone()).await.expect("Failed to save cache entry.");

		assert!(dir.join("abc123.json").exists());
		assert_eq!(cache.load("abc123").await.expect("Failed to load cache entry."), Some(entry));
		assert!(cache.load("../escape").await.is_err(), "Path-like keys must be rejected.");

		cache.evict("abc123").await.expect("Failed to evict cache entry.");

		assert_eq!(cache.load("abc123").await.expect("Load after evict should succeed."), None);

		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary cache directory {}: {e}", dir.display())
		});
	}
}
