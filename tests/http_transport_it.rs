// crates.io
use httpmock::prelude::*;
use oauth2::http::{Method, Request};
// self
use oidc_engine::http::{HttpTransport, ReqwestHttpClient};

#[tokio::test]
async fn default_transport_returns_redirects_unfollowed() {
	let server = MockServer::start_async().await;
	let redirect = server
		.mock_async(|when, then| {
			when.method(POST).path("/token");
			then.status(302).header("location", "/elsewhere");
		})
		.await;
	let elsewhere = server
		.mock_async(|when, then| {
			when.path("/elsewhere");
			then.status(200).body("followed");
		})
		.await;
	let transport = ReqwestHttpClient::new().expect("Transport should build.");
	let request = Request::builder()
		.method(Method::POST)
		.uri(server.url("/token"))
		.body(b"grant_type=client_credentials".to_vec())
		.expect("Request should build.");
	let response = transport.execute(request).await.expect("Redirects are plain responses.");

	redirect.assert_async().await;
	elsewhere.assert_calls_async(0).await;

	assert_eq!(response.status().as_u16(), 302);
	assert_eq!(
		response.headers().get("location").and_then(|value| value.to_str().ok()),
		Some("/elsewhere")
	);
}
