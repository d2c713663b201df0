//! Engine-level error taxonomy shared across endpoints, providers, extensions, and flows.

// self
use crate::_prelude::*;

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or programmer error; never retried.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Structured (or unstructured) OAuth 2.0 error response.
	#[error(transparent)]
	Protocol(#[from] ProtocolError),
	/// Transport failure (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Token or response failed validation.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Compact JWS could not be decoded or verified.
	#[error(transparent)]
	Decode(#[from] crate::jose::DecodeError),
	/// Authorization flow state violation.
	#[error(transparent)]
	Flow(#[from] FlowError),
	/// Session store or configuration cache failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),

	/// Provider metadata does not advertise the requested operation.
	#[error("Provider does not support the {operation} operation.")]
	Unsupported {
		/// Operation (endpoint name or discovery target) that is unavailable.
		operation: String,
	},
}
impl Error {
	/// Builds an [`Error::Unsupported`] for the provided operation label.
	pub fn unsupported(operation: impl Into<String>) -> Self {
		Self::Unsupported { operation: operation.into() }
	}

	/// Returns the protocol error code when the error originated from the provider.
	pub fn protocol_code(&self) -> Option<&ErrorCode> {
		match self {
			Self::Protocol(err) => Some(&err.code),
			_ => None,
		}
	}
}

/// Configuration and programmer errors raised by the engine.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// A URL (metadata entry, redirect URI, base URL) cannot be parsed.
	#[error("URL `{url}` is invalid.")]
	InvalidUrl {
		/// Offending URL string.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Provider metadata violates its invariants.
	#[error("Provider metadata is invalid: {reason}.")]
	InvalidMetadata {
		/// Human-readable reason.
		reason: String,
	},
	/// Endpoint name is not registered for the client.
	#[error("Endpoint `{name}` is not registered.")]
	UnknownEndpoint {
		/// Requested endpoint name.
		name: String,
	},
	/// Registered endpoint has a different kind than the caller expected.
	#[error("Endpoint `{name}` is a {found} endpoint, expected {expected}.")]
	EndpointKindMismatch {
		/// Endpoint name.
		name: String,
		/// Kind the caller asked for.
		expected: &'static str,
		/// Kind actually registered.
		found: &'static str,
	},
	/// Endpoint call lacks a parameter it cannot work without.
	#[error("Endpoint `{endpoint}` requires the `{parameter}` parameter.")]
	MissingParameter {
		/// Endpoint name.
		endpoint: String,
		/// Missing parameter name.
		parameter: &'static str,
	},
	/// Selected client authentication method needs a client secret.
	#[error("Client authentication method `{method}` requires a client secret.")]
	MissingClientSecret {
		/// Authentication method name.
		method: &'static str,
	},
	/// Client secret is too short for the HMAC algorithm.
	#[error("Client secret must be at least {required} bytes for {algorithm}.")]
	WeakClientSecret {
		/// Algorithm name.
		algorithm: &'static str,
		/// Minimum number of bytes.
		required: usize,
	},
	/// Requested algorithm is unknown or disabled.
	#[error("Algorithm `{algorithm}` is not enabled.")]
	UnsupportedAlgorithm {
		/// Algorithm name as supplied.
		algorithm: String,
	},
	/// Client option has an unexpected type or value.
	#[error("Client option `{key}` is invalid: {reason}.")]
	InvalidOption {
		/// Option key.
		key: String,
		/// Human-readable reason.
		reason: String,
	},
	/// Client authentication method name is not recognized.
	#[error("Client authentication method `{method}` is not supported.")]
	UnsupportedAuthMethod {
		/// Method name as supplied.
		method: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a URL parsing failure.
	pub fn invalid_url(url: impl Into<String>, source: url::ParseError) -> Self {
		Self::InvalidUrl { url: url.into(), source }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// OAuth 2.0 error codes (RFC 6749 §5.2/§4.1.2.1, RFC 6750 §3.1).
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorCode {
	/// `invalid_request`.
	InvalidRequest,
	/// `invalid_client`.
	InvalidClient,
	/// `invalid_grant`.
	InvalidGrant,
	/// `invalid_scope`.
	InvalidScope,
	/// `unauthorized_client`.
	UnauthorizedClient,
	/// `unsupported_grant_type`.
	UnsupportedGrantType,
	/// `unsupported_response_type`.
	UnsupportedResponseType,
	/// `access_denied`.
	AccessDenied,
	/// `server_error`.
	ServerError,
	/// `temporarily_unavailable`.
	TemporarilyUnavailable,
	/// `invalid_token` (bearer token usage).
	InvalidToken,
	/// `insufficient_scope` (bearer token usage).
	InsufficientScope,
	/// Any other code supplied by the provider.
	Unrecognized(String),
	/// The provider's error body was not a structured OAuth error.
	Unstructured,
}
impl ErrorCode {
	/// Parses a provider-supplied `error` value.
	pub fn parse(value: &str) -> Self {
		const KNOWN: [(&str, ErrorCode); 12] = [
			("invalid_request", ErrorCode::InvalidRequest),
			("invalid_client", ErrorCode::InvalidClient),
			("invalid_grant", ErrorCode::InvalidGrant),
			("invalid_scope", ErrorCode::InvalidScope),
			("unauthorized_client", ErrorCode::UnauthorizedClient),
			("unsupported_grant_type", ErrorCode::UnsupportedGrantType),
			("unsupported_response_type", ErrorCode::UnsupportedResponseType),
			("access_denied", ErrorCode::AccessDenied),
			("server_error", ErrorCode::ServerError),
			("temporarily_unavailable", ErrorCode::TemporarilyUnavailable),
			("invalid_token", ErrorCode::InvalidToken),
			("insufficient_scope", ErrorCode::InsufficientScope),
		];

		KNOWN
			.into_iter()
			.find(|(name, _)| value.eq_ignore_ascii_case(name))
			.map(|(_, code)| code)
			.unwrap_or_else(|| ErrorCode::Unrecognized(value.to_owned()))
	}

	/// Returns the wire representation of the code.
	pub fn as_str(&self) -> &str {
		match self {
			Self::InvalidRequest => "invalid_request",
			Self::InvalidClient => "invalid_client",
			Self::InvalidGrant => "invalid_grant",
			Self::InvalidScope => "invalid_scope",
			Self::UnauthorizedClient => "unauthorized_client",
			Self::UnsupportedGrantType => "unsupported_grant_type",
			Self::UnsupportedResponseType => "unsupported_response_type",
			Self::AccessDenied => "access_denied",
			Self::ServerError => "server_error",
			Self::TemporarilyUnavailable => "temporarily_unavailable",
			Self::InvalidToken => "invalid_token",
			Self::InsufficientScope => "insufficient_scope",
			Self::Unrecognized(value) => value,
			Self::Unstructured => "unstructured",
		}
	}
}
impl Display for ErrorCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// OAuth 2.0 error surfaced by the provider (token endpoint, callback, bearer challenge).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProtocolError {
	/// Error code.
	pub code: ErrorCode,
	/// HTTP status, absent for errors delivered through the authorization redirect.
	pub status: Option<u16>,
	/// Provider-supplied `error_description`.
	pub description: Option<String>,
	/// Provider-supplied `error_uri`.
	pub uri: Option<String>,
	/// Raw body text for unstructured responses.
	pub body: Option<String>,
	/// `Retry-After` hint, when supplied.
	pub retry_after: Option<Duration>,
}
impl ProtocolError {
	const BODY_PREVIEW_LIMIT: usize = 256;

	/// Creates an error for the provided code.
	pub fn new(code: ErrorCode) -> Self {
		Self { code, status: None, description: None, uri: None, body: None, retry_after: None }
	}

	/// Creates an unstructured error carrying the raw response body.
	pub fn unstructured(status: u16, body: impl Into<String>) -> Self {
		Self::new(ErrorCode::Unstructured).with_status(status).with_body(body)
	}

	/// Adds the HTTP status.
	pub fn with_status(mut self, status: u16) -> Self {
		self.status = Some(status);

		self
	}

	/// Adds the `error_description`.
	pub fn with_description(mut self, description: impl Into<String>) -> Self {
		self.description = Some(description.into());

		self
	}

	/// Adds the `error_uri`.
	pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
		self.uri = Some(uri.into());

		self
	}

	/// Adds the raw body text.
	pub fn with_body(mut self, body: impl Into<String>) -> Self {
		self.body = Some(body.into());

		self
	}

	/// Adds a `Retry-After` hint.
	pub fn with_retry_after(mut self, retry_after: Option<Duration>) -> Self {
		self.retry_after = retry_after;

		self
	}
}
impl Display for ProtocolError {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Provider returned an OAuth error: {}", self.code)?;

		if let Some(status) = self.status {
			write!(f, " (HTTP {status})")?;
		}
		if let Some(description) = &self.description {
			write!(f, ": {description}")?;
		} else if let Some(body) = &self.body {
			write!(f, ": {}", truncate_preview(body))?;
		}

		f.write_str(".")
	}
}
impl StdError for ProtocolError {}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the provider.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the provider.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Token, claim, and response validation failures.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// A required claim is absent.
	#[error("Required claim `{claim}` is missing.")]
	MissingClaim {
		/// Claim name.
		claim: &'static str,
	},
	/// A claim does not hold the expected value.
	#[error("Claim `{claim}` has unexpected value `{found}` (expected `{expected}`).")]
	ClaimMismatch {
		/// Claim name.
		claim: &'static str,
		/// Expected value.
		expected: String,
		/// Observed value.
		found: String,
	},
	/// A time-based claim is in the past.
	#[error("Claim `{claim}` expired at {value}.")]
	Expired {
		/// Claim name.
		claim: &'static str,
		/// Observed UNIX timestamp.
		value: i64,
	},
	/// `iat` is older than the accepted skew.
	#[error("Claim `iat` ({value}) is older than the allowed skew of {max_skew}.")]
	IssuedTooLongAgo {
		/// Observed UNIX timestamp.
		value: i64,
		/// Accepted skew.
		max_skew: Duration,
	},
	/// Token response lacks an ID Token although one is required.
	#[error("Token response does not contain an ID Token.")]
	MissingIdToken,
	/// Requested scope is not allowed.
	#[error("Scope `{scope}` is not allowed.")]
	InvalidScope {
		/// Offending scope.
		scope: String,
	},
	/// Provider responded with JSON that does not match the expected shape.
	#[error("Provider returned a malformed {context} response.")]
	MalformedResponse {
		/// What was being parsed.
		context: &'static str,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Authorization Code flow violations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum FlowError {
	/// Callback handled before an authorization request was issued.
	#[error("Authorization flow has not been started.")]
	NotStarted,
	/// Callback `state` is missing or does not match the stored value.
	#[error("Authorization response carries an invalid state.")]
	InvalidState,
	/// Callback lacks the authorization `code`.
	#[error("Authorization response does not contain a code.")]
	MissingCode,
}

fn truncate_preview(body: &str) -> String {
	if body.chars().count() <= ProtocolError::BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = String::new();

	for (idx, ch) in body.chars().enumerate() {
		if idx >= ProtocolError::BODY_PREVIEW_LIMIT {
			buf.push('…');

			break;
		}
		buf.push(ch);
	}

	buf
}
