//! Session storage and provider configuration cache contracts, plus built-in backends.

pub mod file;
pub mod memory;

pub use file::{FileConfigCache, FileStore};
pub use memory::{MemoryConfigCache, MemoryStore};

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, provider::CachedProviderConfig};

/// Well-known session keys written by the engine.
pub mod keys {
	/// Pending authorization request (`state`, `redirect_uri`, request parameters).
	pub const AUTHORIZATION_STATE: &str = "oidc_engine.authorization_state";
	/// PKCE code verifier awaiting the token exchange.
	pub const PKCE_VERIFIER: &str = "oidc_engine.pkce_verifier";
	/// OpenID Connect nonce sent with the authorization request.
	pub const OIDC_NONCE: &str = "oidc_engine.oidc_nonce";
	/// Last token response persisted by the token storage extension.
	pub const TOKEN_RESPONSE: &str = "oidc_engine.token_response";
}

/// Future returned by [`ConfigCache`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key/value storage scoped to one logical session (one end user, one browser).
///
/// Implementations must make [`take`](Self::take) atomic so a stored `state` or PKCE
/// verifier can be consumed exactly once.
pub trait SessionStore
where
	Self: Send + Sync,
{
	/// Reads the value stored under `key`.
	fn get(&self, key: &str) -> Result<Option<Value>, StoreError>;

	/// Stores `value` under `key`, replacing any previous value.
	fn set(&self, key: &str, value: Value) -> Result<(), StoreError>;

	/// Removes and returns the value stored under `key` in one step.
	fn take(&self, key: &str) -> Result<Option<Value>, StoreError>;

	/// Removes the value stored under `key`.
	fn remove(&self, key: &str) -> Result<(), StoreError> {
		self.take(key).map(|_| ())
	}
}
impl dyn SessionStore {
	/// Reads and deserializes the value under `key`.
	pub fn get_as<T>(&self, key: &str) -> Result<Option<T>, StoreError>
	where
		T: DeserializeOwned,
	{
		self.get(key)?.map(|value| from_value(key, value)).transpose()
	}

	/// Serializes and stores `value` under `key`.
	pub fn set_as<T>(&self, key: &str, value: &T) -> Result<(), StoreError>
	where
		T: Serialize,
	{
		let value = serde_json::to_value(value).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize session value `{key}`: {e}"),
		})?;

		self.set(key, value)
	}

	/// Atomically removes and deserializes the value under `key`.
	pub fn take_as<T>(&self, key: &str) -> Result<Option<T>, StoreError>
	where
		T: DeserializeOwned,
	{
		self.take(key)?.map(|value| from_value(key, value)).transpose()
	}
}

/// Cache for discovered provider configurations, keyed by the SHA-256 of the base URL.
pub trait ConfigCache
where
	Self: Send + Sync,
{
	/// Loads the cached configuration for `key`, if present.
	fn load<'a>(&'a self, key: &'a str) -> StoreFuture<'a, Option<CachedProviderConfig>>;

	/// Persists `entry` under `key`.
	fn save<'a>(&'a self, key: &'a str, entry: CachedProviderConfig) -> StoreFuture<'a, ()>;

	/// Drops the entry under `key`.
	fn evict<'a>(&'a self, key: &'a str) -> StoreFuture<'a, ()>;
}

/// Error type produced by [`SessionStore`] and [`ConfigCache`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

fn from_value<T>(key: &str, value: Value) -> Result<T, StoreError>
where
	T: DeserializeOwned,
{
	serde_json::from_value(value).map_err(|e| StoreError::Serialization {
		message: format!("Failed to deserialize session value `{key}`: {e}"),
	})
}
