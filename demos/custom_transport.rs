//! Plugs a custom [`HttpTransport`] into the engine.
//!
//! The transport below answers token requests from memory, which is handy for tests that
//! should not open sockets. Transport failures surface as [`Error::Transport`], while
//! provider error bodies still map onto the OAuth error taxonomy.

// std
use std::{
	error::Error as StdError,
	fmt::{Display, Formatter, Result as FmtResult},
	sync::Arc,
};
// crates.io
use color_eyre::Result;
// self
use oidc_engine::{
	client::{Client, ClientConfig},
	error::{Error, TransportError},
	http::{HttpFuture, HttpRequest, HttpResponse, HttpTransport},
	oauth2::http::StatusCode,
	provider::{Provider, ProviderMetadata},
	store::MemoryStore,
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let metadata = ProviderMetadata::builder("https://provider.example.com")
		.endpoint("token", "https://provider.example.com/token")
		.require_https(true)
		.build()?;

	for behavior in [Behavior::Issue, Behavior::Reject, Behavior::Unreachable] {
		let provider = Provider::new(metadata.clone(), Arc::new(StaticTransport(behavior)));
		let client = Client::new(
			ClientConfig::new("demo-client").with_secret("demo-secret"),
			provider,
			Arc::new(MemoryStore::default()),
		);

		match client.client_credentials(None).await {
			Ok(token) => println!("{behavior}: issued {}.", token.access_token()),
			Err(Error::Transport(e)) => println!("{behavior}: transport failed: {e}"),
			Err(e) => println!("{behavior}: provider refused: {e}"),
		}
	}

	Ok(())
}

#[derive(Clone, Copy, Debug)]
enum Behavior {
	Issue,
	Reject,
	Unreachable,
}
impl Display for Behavior {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		match self {
			Self::Issue => f.write_str("issue"),
			Self::Reject => f.write_str("reject"),
			Self::Unreachable => f.write_str("unreachable"),
		}
	}
}

#[derive(Debug)]
struct Offline;
impl Display for Offline {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("provider.example.com is unreachable")
	}
}
impl StdError for Offline {}

struct StaticTransport(Behavior);
impl HttpTransport for StaticTransport {
	fn execute(&self, _request: HttpRequest) -> HttpFuture<'_> {
		let behavior = self.0;

		Box::pin(async move {
			let (status, body): (StatusCode, &[u8]) = match behavior {
				Behavior::Issue => (
					StatusCode::OK,
					b"{\"access_token\":\"static-access\",\"token_type\":\"Bearer\"}",
				),
				Behavior::Reject => (StatusCode::BAD_REQUEST, b"{\"error\":\"invalid_client\"}"),
				Behavior::Unreachable => return Err(TransportError::network(Offline)),
			};
			let mut response = HttpResponse::new(body.to_vec());

			*response.status_mut() = status;

			Ok(response)
		})
	}
}
