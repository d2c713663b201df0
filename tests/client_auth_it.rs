// crates.io
use httpmock::prelude::*;
// self
use oidc_engine::{
	_preludet::*,
	auth::JWT_BEARER_ASSERTION_TYPE,
	client::{ClientConfig, options},
	endpoint::TokenTypeHint,
	error::ConfigError,
};

const LONG_SECRET: &str = "a-client-secret-that-is-long-enough-for-hs256";

fn token_ok(then: httpmock::Then) {
	then.status(200)
		.header("content-type", "application/json")
		.body("{\"access_token\":\"at\",\"token_type\":\"Bearer\"}");
}

#[tokio::test]
async fn client_secret_post_sends_credentials_in_the_form() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("post-client")
		.with_secret("post-secret")
		.with_option(options::TOKEN_ENDPOINT_AUTH_METHOD, "client_secret_post");
	let (client, _store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header_missing("authorization")
				.body_includes("client_id=post-client")
				.body_includes("client_secret=post-secret");
			token_ok(then);
		})
		.await;

	client.client_credentials(None).await.expect("Token request should succeed.");
	mock.assert_async().await;
}

#[tokio::test]
async fn client_secret_jwt_sends_an_assertion() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("jwt-client")
		.with_secret(LONG_SECRET)
		.with_option(options::TOKEN_ENDPOINT_AUTH_METHOD, "client_secret_jwt");
	let (client, _store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let assertion_type = format!(
		"client_assertion_type={}",
		url::form_urlencoded::byte_serialize(JWT_BEARER_ASSERTION_TYPE.as_bytes()).collect::<String>()
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header_missing("authorization")
				.body_includes("client_id=jwt-client")
				.body_includes(assertion_type.as_str())
				.body_includes("client_assertion=ey");
			token_ok(then);
		})
		.await;

	client.client_credentials(None).await.expect("Token request should succeed.");
	mock.assert_async().await;
}

#[tokio::test]
async fn weak_secrets_cannot_sign_assertions() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("jwt-client")
		.with_secret("short")
		.with_option(options::TOKEN_ENDPOINT_AUTH_METHOD, "client_secret_jwt");
	let (client, _store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let err = client.client_credentials(None).await.expect_err("Secret is too short for HS256.");

	assert!(matches!(err, Error::Config(ConfigError::WeakClientSecret { .. })));
}

#[tokio::test]
async fn public_clients_only_send_their_identifier() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_test_client(
		ClientConfig::new("public-client"),
		test_provider(test_metadata(&server.base_url())),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.header_missing("authorization")
				.body_includes("client_id=public-client")
				.body_includes("grant_type=refresh_token");
			token_ok(then);
		})
		.await;

	client.refresh_token("rt", None).await.expect("Refresh should succeed.");
	mock.assert_async().await;
}

#[tokio::test]
async fn endpoint_specific_methods_override_the_token_method() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("mixed-client")
		.with_secret("mixed-secret")
		.with_option(options::endpoint_auth_method("revocation"), "client_secret_post");
	let (client, _store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let revoke = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/revoke")
				.header_missing("authorization")
				.body_includes("client_secret=mixed-secret");
			then.status(200);
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").header_exists("authorization");
			token_ok(then);
		})
		.await;

	client
		.revoke("at", Some(TokenTypeHint::AccessToken))
		.await
		.expect("Revocation should succeed.");
	client.client_credentials(None).await.expect("Token request should succeed.");
	revoke.assert_async().await;
	token.assert_async().await;
}

#[tokio::test]
async fn advertised_methods_are_honored() {
	let server = MockServer::start_async().await;
	let metadata = test_metadata(&server.base_url()).with(
		"token_endpoint_auth_methods_supported",
		serde_json::json!(["private_key_jwt", "client_secret_post"]),
	);
	let (client, _store) = build_test_client(
		ClientConfig::new("advertised-client").with_secret("advertised-secret"),
		test_provider(metadata),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/token").body_includes("client_secret=advertised-secret");
			token_ok(then);
		})
		.await;

	client.client_credentials(None).await.expect("Token request should succeed.");
	mock.assert_async().await;
}

#[tokio::test]
async fn explicit_methods_without_a_secret_fail() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("public-client")
		.with_option(options::TOKEN_ENDPOINT_AUTH_METHOD, "client_secret_basic");
	let (client, _store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let err = client.client_credentials(None).await.expect_err("A secret is required.");

	assert!(matches!(err, Error::Config(ConfigError::MissingClientSecret { .. })));
}
