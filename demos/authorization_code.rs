//! Walks through an Authorization Code + PKCE login against a local mock provider.
//!
//! 1. Build a [`Client`] for a manually configured provider and register [`Pkce`].
//! 2. Redirect the user to the URI from `authorization_uri`.
//! 3. Feed the callback query back into `handle_authorization_response`.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
// self
use oidc_engine::{
	auth::ScopeSet,
	client::{Client, ClientConfig},
	endpoint::Params,
	ext::{Pkce, TokenStorage},
	http::ReqwestHttpClient,
	provider::{Provider, ProviderMetadata},
	store::{MemoryStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("code_verifier=");
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"demo-access\",\"token_type\":\"Bearer\",\"expires_in\":900}",
			);
		})
		.await;
	let metadata = ProviderMetadata::builder(server.base_url())
		.endpoint("authorization", server.url("/authorize"))
		.endpoint("token", server.url("/token"))
		.set("code_challenge_methods_supported", vec!["S256"])
		.build()?;
	let provider = Provider::new(metadata, Arc::new(ReqwestHttpClient::new()?));
	let store: Arc<dyn SessionStore> = Arc::new(MemoryStore::default());
	let config = ClientConfig::new("demo-client")
		.with_secret("demo-secret")
		.with_scopes(ScopeSet::new(["profile", "email"])?);
	let client =
		Client::new(config, provider, store).register(&Pkce::new())?.register(&TokenStorage)?;
	let flow = client.authorization_code();
	let redirect =
		flow.authorization_uri(Some("http://localhost:8080/callback"), &Params::new()).await?;

	println!("Send the user to {redirect}.");

	// The provider would redirect back with `code` and the same `state`.
	let state = redirect
		.query_pairs()
		.find(|(key, _)| key == "state")
		.map(|(_, value)| value.into_owned())
		.unwrap_or_default();
	let callback = Params::new().set("code", "demo-code").set("state", state);
	let token = flow.handle_authorization_response(&callback).await?;

	println!("Access token expires in {:?}.", token.expires_in());
	println!("Stored for later calls: {}.", TokenStorage::load(client.store())?.is_some());

	token_mock.assert_async().await;

	Ok(())
}
