//! HTTP transport seam and response-header helpers.
//!
//! The engine talks HTTP exclusively through [`HttpTransport`], using the `http` crate types
//! re-exported by `oauth2` ([`HttpRequest`]/[`HttpResponse`]). The default
//! [`ReqwestHttpClient`] is available behind the `reqwest` feature; anything else (a
//! recording client in tests, a corporate proxy wrapper) only has to implement one method.

// crates.io
use oauth2::http::{
	HeaderMap,
	header::{RETRY_AFTER, WWW_AUTHENTICATE},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{_prelude::*, error::TransportError};

pub use oauth2::{HttpRequest, HttpResponse};

/// Future returned by [`HttpTransport::execute`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<HttpResponse, TransportError>> + 'a + Send>>;

/// Executes one HTTP round trip.
///
/// Implementations must not follow redirects for POST requests and must return 4xx/5xx
/// responses as `Ok` so the provider can map them into the OAuth error taxonomy. Only
/// failures that produced no response at all belong in [`TransportError`].
pub trait HttpTransport
where
	Self: 'static + Send + Sync,
{
	/// Sends `request` and resolves to the full response.
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_>;
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
/// Token and discovery requests should not follow redirects; configure any custom
/// [`ReqwestClient`] accordingly before wrapping it.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug)]
pub struct ReqwestHttpClient(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that never follows redirects.
	pub fn new() -> Result<Self, crate::error::ConfigError> {
		let client = ReqwestClient::builder().redirect(reqwest::redirect::Policy::none()).build()?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestHttpClient {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl HttpTransport for ReqwestHttpClient {
	fn execute(&self, request: HttpRequest) -> HttpFuture<'_> {
		let client = self.0.clone();

		Box::pin(async move {
			let request: reqwest::Request = request.try_into().map_err(TransportError::network)?;
			let response = client.execute(request).await?;
			let status = response.status();
			let headers = response.headers().to_owned();
			let mut response_new = HttpResponse::new(response.bytes().await?.to_vec());

			*response_new.status_mut() = status;
			*response_new.headers_mut() = headers;

			Ok(response_new)
		})
	}
}

/// Parses a `Retry-After` header (delta-seconds or HTTP date) into a relative duration.
pub fn retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(secs as i64));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}

/// Extracts the auth-params of a `WWW-Authenticate: Bearer ...` challenge (RFC 6750 §3).
pub fn bearer_challenge(headers: &HeaderMap) -> Option<BTreeMap<String, String>> {
	headers.get_all(WWW_AUTHENTICATE).iter().filter_map(|value| value.to_str().ok()).find_map(
		|raw| {
			let raw = raw.trim();
			let (scheme, rest) = raw.split_once(char::is_whitespace).unwrap_or((raw, ""));

			scheme.eq_ignore_ascii_case("bearer").then(|| parse_auth_params(rest))
		},
	)
}

/// Returns the `Content-Type` media type (without parameters), lowercased.
pub fn media_type(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(oauth2::http::header::CONTENT_TYPE)?.to_str().ok()?;

	Some(value.split(';').next().unwrap_or(value).trim().to_ascii_lowercase())
}

fn parse_auth_params(input: &str) -> BTreeMap<String, String> {
	let mut params = BTreeMap::new();
	let mut rest = input.trim();

	while !rest.is_empty() {
		let Some((name, after)) = rest.split_once('=') else {
			break;
		};
		let name = name.trim().trim_start_matches(',').trim().to_ascii_lowercase();
		let after = after.trim_start();
		let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
			let mut value = String::new();
			let mut chars = quoted.char_indices();
			let mut end = quoted.len();

			while let Some((idx, ch)) = chars.next() {
				match ch {
					'\\' =>
						if let Some((_, escaped)) = chars.next() {
							value.push(escaped);
						},
					'"' => {
						end = idx + 1;

						break;
					},
					_ => value.push(ch),
				}
			}

			(value, &quoted[end.min(quoted.len())..])
		} else {
			let end = after.find(',').unwrap_or(after.len());

			(after[..end].trim().to_owned(), &after[end..])
		};

		params.insert(name, value);
		rest = remaining.trim_start().trim_start_matches(',').trim_start();
	}

	params
}
