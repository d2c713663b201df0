//! Discovers a provider from its well-known document and caches the result on disk.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::json;
// self
use oidc_engine::{
	client::{Client, ClientConfig, END_SESSION},
	endpoint::Params,
	http::ReqwestHttpClient,
	provider::Discovery,
	store::{FileConfigCache, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let document = json!({
		"issuer": server.base_url(),
		"authorization_endpoint": server.url("/authorize"),
		"token_endpoint": server.url("/token"),
		"end_session_endpoint": server.url("/logout"),
	});
	let well_known = server
		.mock_async(|when, then| {
			when.method(GET).path("/.well-known/openid-configuration");
			then.status(200).header("content-type", "application/json").json_body(document);
		})
		.await;
	let cache_dir = env::temp_dir().join("oidc-engine-discovery-demo");
	let discovery = Arc::new(
		Discovery::new(Arc::new(ReqwestHttpClient::new()?))
			.with_cache(Arc::new(FileConfigCache::open(&cache_dir)?)),
	);

	discovery.invalidate(&server.base_url()).await?;

	let client = Client::new(
		ClientConfig::new("demo-client").with_openid(true),
		discovery.lazy(server.base_url()),
		Arc::new(MemoryStore::default()),
	);
	let provider = client.provider().await?;

	println!("Discovered {} (OpenID: {}).", provider.issuer(), provider.is_openid());
	println!(
		"Cached under {}.",
		cache_dir.join(format!("{}.json", Discovery::cache_key(&server.base_url()))).display()
	);

	let logout = client
		.endpoint_uri(END_SESSION, &Params::new().set("client_id", "demo-client"))
		.await?;

	println!("Logout URI: {logout}.");

	well_known.assert_async().await;

	Ok(())
}
