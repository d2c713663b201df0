//! Typed response snapshots built from decoded JSON or JWT bodies.
//!
//! Every response wraps a [`Claims`] map and never changes after construction; listeners that
//! enrich a response (the ID Token validator attaching a verified token, for example)
//! return a new value.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	error::ValidationError,
	jose::{Claims, Jwt},
};

/// Deserializes a JSON body, reporting the failing path on error.
pub fn parse_json<T>(context: &'static str, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut deserializer = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| ValidationError::MalformedResponse { context, source }.into())
}

/// Token endpoint response (RFC 6749 §5.1).
#[derive(Clone, PartialEq)]
pub struct TokenResponse {
	claims: Claims,
	id_token: Option<IdToken>,
}
impl TokenResponse {
	/// Wraps a decoded response body; `access_token` is mandatory.
	pub fn from_claims(claims: Claims) -> Result<Self, ValidationError> {
		if claims.str("access_token").is_none() {
			return Err(ValidationError::MissingClaim { claim: "access_token" });
		}

		Ok(Self { claims, id_token: None })
	}

	/// Parses a JSON body.
	pub fn from_json(body: &[u8]) -> Result<Self> {
		Ok(Self::from_claims(parse_json("token", body)?)?)
	}

	/// Every member of the response.
	pub fn claims(&self) -> &Claims {
		&self.claims
	}

	/// Issued access token.
	pub fn access_token(&self) -> &str {
		self.claims.str("access_token").unwrap_or_default()
	}

	/// `token_type`, typically `Bearer`.
	pub fn token_type(&self) -> Option<&str> {
		self.claims.str("token_type")
	}

	/// Refresh token, when issued.
	pub fn refresh_token(&self) -> Option<&str> {
		self.claims.str("refresh_token")
	}

	/// Access token lifetime.
	pub fn expires_in(&self) -> Option<Duration> {
		self.claims.i64("expires_in").map(Duration::seconds)
	}

	/// Granted scope, when the provider echoes it.
	pub fn scope(&self) -> Option<ScopeSet> {
		self.claims.str("scope").map(ScopeSet::parse)
	}

	/// Raw `id_token` member.
	pub fn id_token_raw(&self) -> Option<&str> {
		self.claims.str("id_token")
	}

	/// Verified ID Token, once the OpenID Connect extension has validated it.
	pub fn id_token(&self) -> Option<&IdToken> {
		self.id_token.as_ref()
	}

	/// Returns a copy carrying the verified ID Token.
	pub fn with_id_token(&self, id_token: IdToken) -> Self {
		Self { claims: self.claims.clone(), id_token: Some(id_token) }
	}
}
impl Debug for TokenResponse {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenResponse")
			.field("token_type", &self.token_type())
			.field("expires_in", &self.expires_in())
			.field("scope", &self.claims.str("scope"))
			.field("has_refresh_token", &self.refresh_token().is_some())
			.field("id_token", &self.id_token)
			.finish()
	}
}

/// Verified OpenID Connect ID Token.
#[derive(Clone, PartialEq)]
pub struct IdToken(Jwt);
impl IdToken {
	/// Wraps a verified JWT. Callers are responsible for claim validation.
	pub fn new(jwt: Jwt) -> Self {
		Self(jwt)
	}

	/// Underlying JWT.
	pub fn jwt(&self) -> &Jwt {
		&self.0
	}

	/// Payload claims.
	pub fn claims(&self) -> &Claims {
		self.0.claims()
	}

	/// Subject identifier (`sub`).
	pub fn subject(&self) -> &str {
		self.claims().str("sub").unwrap_or_default()
	}

	/// Issuer (`iss`).
	pub fn issuer(&self) -> &str {
		self.claims().str("iss").unwrap_or_default()
	}

	/// Nonce echoed from the authorization request.
	pub fn nonce(&self) -> Option<&str> {
		self.claims().str("nonce")
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.claims().time("exp")
	}
}
impl Debug for IdToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("IdToken")
			.field("iss", &self.issuer())
			.field("sub", &self.subject())
			.field("alg", &self.0.algorithm())
			.finish()
	}
}

/// Token introspection response (RFC 7662 §2.2).
#[derive(Clone, Debug, PartialEq)]
pub struct IntrospectionResponse(Claims);
impl IntrospectionResponse {
	/// Wraps decoded claims.
	pub fn from_claims(claims: Claims) -> Self {
		Self(claims)
	}

	/// Parses a JSON body.
	pub fn from_json(body: &[u8]) -> Result<Self> {
		Ok(Self(parse_json("introspection", body)?))
	}

	/// `{"active": false}`.
	pub fn inactive() -> Self {
		Self(Claims::new().with("active", false))
	}

	/// Every member of the response.
	pub fn claims(&self) -> &Claims {
		&self.0
	}

	/// Whether the token is active; absent or malformed values count as inactive.
	pub fn active(&self) -> bool {
		self.0.bool("active").unwrap_or(false)
	}

	/// Granted scope.
	pub fn scope(&self) -> Option<ScopeSet> {
		self.0.str("scope").map(ScopeSet::parse)
	}

	/// Client the token was issued to.
	pub fn client_id(&self) -> Option<&str> {
		self.0.str("client_id")
	}

	/// Resource owner username.
	pub fn username(&self) -> Option<&str> {
		self.0.str("username")
	}

	/// Token type.
	pub fn token_type(&self) -> Option<&str> {
		self.0.str("token_type")
	}

	/// Subject.
	pub fn subject(&self) -> Option<&str> {
		self.0.str("sub")
	}

	/// Issuer.
	pub fn issuer(&self) -> Option<&str> {
		self.0.str("iss")
	}

	/// Expiry instant.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.0.time("exp")
	}
}

/// Userinfo response (OpenID Connect Core §5.3.2), plain JSON or signed JWT.
#[derive(Clone, Debug, PartialEq)]
pub struct UserinfoResponse {
	claims: Claims,
	signed: Option<Jwt>,
}
impl UserinfoResponse {
	/// Wraps a plain JSON response.
	pub fn from_claims(claims: Claims) -> Self {
		Self { claims, signed: None }
	}

	/// Wraps a verified `application/jwt` response.
	pub fn from_jwt(jwt: Jwt) -> Self {
		Self { claims: jwt.claims().clone(), signed: Some(jwt) }
	}

	/// Every returned claim.
	pub fn claims(&self) -> &Claims {
		&self.claims
	}

	/// Subject identifier.
	pub fn subject(&self) -> Option<&str> {
		self.claims.str("sub")
	}

	/// Signed representation, when the provider returned a JWT.
	pub fn jwt(&self) -> Option<&Jwt> {
		self.signed.as_ref()
	}
}
