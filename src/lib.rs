//! Composable OAuth 2.0 / OpenID Connect client engine.
//!
//! Endpoints are immutable values run through an ordered pipeline of extensions before they
//! are called. Providers come from manual metadata or from cached discovery. PKCE, ID Token
//! validation, local JWT introspection, and client authentication all plug into that
//! pipeline.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod endpoint;
pub mod error;
pub mod ext;
pub mod flows;
pub mod http;
pub mod jose;
pub mod obs;
pub mod provider;
pub mod response;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		client::{Client, ClientConfig},
		http::{HttpTransport, ReqwestHttpClient},
		jose::{Algorithm, Claims, EncodingKey, JwkSet, JwtCodec},
		provider::{Provider, ProviderMetadata},
		store::{MemoryStore, SessionStore},
	};

	/// Issuer advertised by every test provider.
	pub const TEST_ISSUER: &str = "https://issuer.example.com";
	/// Shared HMAC secret used to sign provider-issued test tokens.
	pub const TEST_SIGNING_SECRET: &[u8] = b"test-signing-secret-with-enough-entropy-for-hs256!";
	/// Key identifier attached to [`TEST_SIGNING_SECRET`].
	pub const TEST_KEY_ID: &str = "test-key";

	/// Builds a reqwest HTTP transport suitable for `httpmock` servers.
	pub fn test_http_client() -> Arc<dyn HttpTransport> {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		Arc::new(ReqwestHttpClient::with_client(client))
	}

	/// Symmetric key set holding [`TEST_SIGNING_SECRET`] for `HS256`.
	pub fn test_key_set() -> JwkSet {
		JwkSet {
			keys: vec![
				crate::jose::symmetric_jwk(TEST_SIGNING_SECRET, Algorithm::HS256, Some(TEST_KEY_ID))
					.expect("Failed to build test symmetric key."),
			],
		}
	}

	/// Signs `payload` with the shared test key.
	pub fn sign_test_token(payload: &Claims) -> String {
		JwtCodec::default()
			.encode(
				Algorithm::HS256,
				&EncodingKey::from_secret(TEST_SIGNING_SECRET),
				Some(TEST_KEY_ID),
				payload,
			)
			.expect("Failed to sign test token.")
	}

	/// Metadata for a provider whose endpoints live on `base` (typically an `httpmock` URL).
	pub fn test_metadata(base: &str) -> ProviderMetadata {
		ProviderMetadata::builder(TEST_ISSUER)
			.endpoint("authorization", format!("{base}/authorize"))
			.endpoint("token", format!("{base}/token"))
			.endpoint("revocation", format!("{base}/revoke"))
			.endpoint("introspection", format!("{base}/introspect"))
			.endpoint("userinfo", format!("{base}/userinfo"))
			.build()
			.expect("Failed to build test provider metadata.")
	}

	/// Builds a provider for `metadata` with the shared test key set pre-loaded.
	pub fn test_provider(metadata: ProviderMetadata) -> Arc<Provider> {
		Arc::new(
			Provider::new(metadata, test_http_client())
				.with_openid(true)
				.with_key_set(test_key_set()),
		)
	}

	/// Constructs a [`Client`] backed by an in-memory session store.
	pub fn build_test_client(
		config: ClientConfig,
		provider: Arc<Provider>,
	) -> (Client, Arc<MemoryStore>) {
		let store_backend = Arc::new(MemoryStore::default());
		let store: Arc<dyn SessionStore> = store_backend.clone();

		(Client::new(config, provider, store), store_backend)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, OnceCell as AsyncOnceCell};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use jsonwebtoken;
pub use oauth2;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
