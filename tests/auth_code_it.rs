// crates.io
use httpmock::prelude::*;
// self
use oidc_engine::{
	_preludet::*,
	client::{Client, ClientConfig},
	endpoint::Params,
	error::{ErrorCode, FlowError, ValidationError},
	ext::{Pkce, PkceMethod},
	flows::FlowStatus,
	store::{MemoryStore, keys},
};

const REDIRECT_URI: &str = "https://app.example.com/callback";
const ENCODED_REDIRECT_URI: &str = "https%3A%2F%2Fapp.example.com%2Fcallback";

fn pkce_client(base: &str) -> (Client, Arc<MemoryStore>) {
	let config = ClientConfig::new("web-client")
		.with_secret("web-secret")
		.with_scopes(oidc_engine::auth::ScopeSet::parse("email profile"));
	let (client, store) = build_test_client(config, test_provider(test_metadata(base)));
	let client = client.register(&Pkce::new()).expect("PKCE should register.");

	(client, store)
}

fn query_param(uri: &Url, key: &str) -> Option<String> {
	uri.query_pairs().find(|(name, _)| name == key).map(|(_, value)| value.into_owned())
}

#[tokio::test]
async fn callbacks_before_a_request_are_rejected() {
	let server = MockServer::start_async().await;
	let (client, _store) = pkce_client(&server.base_url());
	let err = client
		.authorization_code()
		.handle_authorization_response(&Params::new().set("code", "c").set("state", "s"))
		.await
		.expect_err("No authorization request is pending.");

	assert!(matches!(err, Error::Flow(FlowError::NotStarted)));
}

#[tokio::test]
async fn authorization_code_with_pkce_round_trip() {
	let server = MockServer::start_async().await;
	let (client, store) = pkce_client(&server.base_url());
	let flow = client.authorization_code();
	let uri = flow
		.authorization_uri(Some(REDIRECT_URI), &Params::new().set("prompt", "consent"))
		.await
		.expect("Authorization URI should build.");

	assert_eq!(uri.path(), "/authorize");
	assert_eq!(query_param(&uri, "response_type").as_deref(), Some("code"));
	assert_eq!(query_param(&uri, "client_id").as_deref(), Some("web-client"));
	assert_eq!(query_param(&uri, "scope").as_deref(), Some("email profile"));
	assert_eq!(query_param(&uri, "prompt").as_deref(), Some("consent"));
	assert_eq!(query_param(&uri, "code_challenge_method").as_deref(), Some("S256"));
	assert_eq!(flow.status().expect("Status should load."), FlowStatus::AwaitingCallback);

	let state = query_param(&uri, "state").expect("State should be generated.");
	let verifier = Pkce::pending_verifier(client.store())
		.expect("Store should be readable.")
		.expect("Verifier should be stored.");

	assert_eq!(state.len(), 43);
	assert_eq!(verifier.len(), 128);
	assert_eq!(query_param(&uri, "code_challenge"), Some(PkceMethod::S256.challenge(&verifier)));

	let verifier_param = format!("code_verifier={verifier}");
	let redirect_param = format!("redirect_uri={ENCODED_REDIRECT_URI}");
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/token")
				.body_includes("grant_type=authorization_code")
				.body_includes("code=auth-code-1")
				.body_includes(verifier_param.as_str())
				.body_includes(redirect_param.as_str());
			then.status(200).header("content-type", "application/json").body(
				"{\"access_token\":\"at-1\",\"token_type\":\"Bearer\",\"refresh_token\":\"rt-1\"}",
			);
		})
		.await;
	let token = flow
		.handle_authorization_response(
			&Params::new().set("code", "auth-code-1").set("state", state.as_str()),
		)
		.await
		.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(token.access_token(), "at-1");
	assert_eq!(token.refresh_token(), Some("rt-1"));
	assert_eq!(flow.status().expect("Status should load."), FlowStatus::NotStarted);
	assert!(!store.contains(keys::PKCE_VERIFIER), "Verifier must be consumed.");

	let replay = flow
		.handle_authorization_response(&Params::new().set("code", "auth-code-1").set("state", state))
		.await
		.expect_err("A callback cannot be replayed.");

	assert!(matches!(replay, Error::Flow(FlowError::NotStarted)));
}

#[tokio::test]
async fn mismatched_state_consumes_the_pending_request() {
	let server = MockServer::start_async().await;
	let (client, _store) = pkce_client(&server.base_url());
	let flow = client.authorization_code();

	flow.authorization_uri(Some(REDIRECT_URI), &Params::new())
		.await
		.expect("Authorization URI should build.");

	let err = flow
		.handle_authorization_response(
			&Params::new().set("code", "auth-code").set("state", "forged-state"),
		)
		.await
		.expect_err("Forged state must be rejected.");

	assert!(matches!(err, Error::Flow(FlowError::InvalidState)));
	assert_eq!(flow.status().expect("Status should load."), FlowStatus::NotStarted);
}

#[tokio::test]
async fn rejected_callbacks_discard_the_verifier_and_nonce() {
	let server = MockServer::start_async().await;
	let config = ClientConfig::new("web-client").with_secret("web-secret").with_openid(true);
	let (client, store) =
		build_test_client(config, test_provider(test_metadata(&server.base_url())));
	let client = client.register(&Pkce::new()).expect("PKCE should register.");
	let flow = client.authorization_code();

	for callback in [
		Params::new().set("code", "auth-code").set("state", "forged-state"),
		Params::new().set("error", "access_denied"),
	] {
		let uri = flow
			.authorization_uri(Some(REDIRECT_URI), &Params::new())
			.await
			.expect("Authorization URI should build.");
		let callback = match callback.get("state") {
			Some(_) => callback,
			None => callback.set("state", query_param(&uri, "state").expect("State is generated.")),
		};

		assert!(store.contains(keys::PKCE_VERIFIER));
		assert!(store.contains(keys::OIDC_NONCE));

		flow.handle_authorization_response(&callback)
			.await
			.expect_err("Rejected callbacks must fail.");

		assert!(!store.contains(keys::PKCE_VERIFIER), "Verifier must not outlive the callback.");
		assert!(!store.contains(keys::OIDC_NONCE), "Nonce must not outlive the callback.");
	}
}

#[tokio::test]
async fn caller_supplied_state_is_kept() {
	let server = MockServer::start_async().await;
	let (client, _store) = pkce_client(&server.base_url());
	let flow = client.authorization_code();
	let uri = flow
		.authorization_uri(None, &Params::new().set("state", "app-state"))
		.await
		.expect("Authorization URI should build.");
	let pending =
		flow.pending().expect("Store should be readable.").expect("Request should be pending.");

	assert_eq!(query_param(&uri, "state").as_deref(), Some("app-state"));
	assert_eq!(pending.state, "app-state");
	assert_eq!(pending.redirect_uri, None);
	assert_eq!(pending.params.get("response_type"), Some("code"));
}

#[tokio::test]
async fn error_callbacks_surface_protocol_errors() {
	let server = MockServer::start_async().await;
	let (client, _store) = pkce_client(&server.base_url());
	let flow = client.authorization_code();
	let uri = flow
		.authorization_uri(Some(REDIRECT_URI), &Params::new())
		.await
		.expect("Authorization URI should build.");
	let state = query_param(&uri, "state").expect("State should be generated.");
	let err = flow
		.handle_authorization_response(
			&Params::new()
				.set("error", "access_denied")
				.set("error_description", "user cancelled")
				.set("state", state),
		)
		.await
		.expect_err("Denied requests fail.");

	assert_eq!(err.protocol_code(), Some(&ErrorCode::AccessDenied));

	let Error::Protocol(protocol) = err else {
		panic!("Expected a protocol error.");
	};

	assert_eq!(protocol.status, None);
	assert_eq!(protocol.description.as_deref(), Some("user cancelled"));
}

#[tokio::test]
async fn callbacks_without_code_fail() {
	let server = MockServer::start_async().await;
	let (client, _store) = pkce_client(&server.base_url());
	let flow = client.authorization_code();
	let uri = flow
		.authorization_uri(Some(REDIRECT_URI), &Params::new())
		.await
		.expect("Authorization URI should build.");
	let state = query_param(&uri, "state").expect("State should be generated.");
	let err = flow
		.handle_authorization_response(&Params::new().set("state", state))
		.await
		.expect_err("A code is required.");

	assert!(matches!(err, Error::Flow(FlowError::MissingCode)));
}

#[tokio::test]
async fn issuer_identification_is_enforced_when_advertised() {
	let server = MockServer::start_async().await;
	let metadata = test_metadata(&server.base_url())
		.with("authorization_response_iss_parameter_supported", true);
	let (client, _store) =
		build_test_client(ClientConfig::new("web-client"), test_provider(metadata));
	let flow = client.authorization_code();
	let uri = flow
		.authorization_uri(Some(REDIRECT_URI), &Params::new())
		.await
		.expect("Authorization URI should build.");
	let state = query_param(&uri, "state").expect("State should be generated.");
	let err = flow
		.handle_authorization_response(
			&Params::new()
				.set("code", "auth-code")
				.set("state", state)
				.set("iss", "https://attacker.example.com"),
		)
		.await
		.expect_err("Mix-up attempts must be rejected.");

	assert!(matches!(err, Error::Validation(ValidationError::ClaimMismatch { claim: "iss", .. })));
}

#[tokio::test]
async fn plain_pkce_is_used_when_it_is_the_only_advertised_method() {
	let server = MockServer::start_async().await;
	let metadata = test_metadata(&server.base_url())
		.with("code_challenge_methods_supported", serde_json::json!(["plain"]));
	let (client, _store) =
		build_test_client(ClientConfig::new("native-client"), test_provider(metadata));
	let client = client.register(&Pkce::new()).expect("PKCE should register.");
	let uri = client
		.authorization_code()
		.authorization_uri(Some(REDIRECT_URI), &Params::new())
		.await
		.expect("Authorization URI should build.");
	let verifier = Pkce::pending_verifier(client.store())
		.expect("Store should be readable.")
		.expect("Verifier should be stored.");

	assert_eq!(query_param(&uri, "code_challenge_method").as_deref(), Some("plain"));
	assert_eq!(query_param(&uri, "code_challenge"), Some(verifier));
}
