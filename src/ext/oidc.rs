//! OpenID Connect: `openid` scope, nonce, and ID Token validation (Core §3.1.3.7).

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, constant_time_eq, random_urlsafe},
	client::{CallContext, ClientConfig, ClientContext, options},
	endpoint::{
		AuthorizationEndpoint, EndpointFuture, Extension, ResponseListener, TokenEndpoint,
		Transformer,
	},
	error::{ConfigError, ValidationError},
	jose::{Algorithm, Claims, half_hash},
	response::{IdToken, TokenResponse},
	store::keys,
};

/// Claims every ID Token must carry.
pub const REQUIRED_ID_TOKEN_CLAIMS: [&str; 5] = ["iss", "sub", "aud", "exp", "iat"];

/// Number of random bytes behind a generated nonce.
const NONCE_BYTES: usize = 32;

/// OpenID Connect extension.
///
/// Active only against providers flagged as OpenID capable. Authorization requests get
/// `openid` as their leading scope and a session-bound `nonce`; token responses are
/// checked by an [`IdTokenValidator`].
#[derive(Clone, Copy, Debug, Default)]
pub struct OpenIdConnect;
impl Extension for OpenIdConnect {
	fn configure(&self, client: &ClientContext) -> Result<Arc<dyn Transformer>> {
		IdTokenValidator::from_config(client.config())?;

		Ok(Arc::new(*self))
	}
}
impl Transformer for OpenIdConnect {
	fn on_authorization(
		&self,
		ctx: &CallContext,
		endpoint: AuthorizationEndpoint,
	) -> Result<AuthorizationEndpoint> {
		if !ctx.provider().is_openid() {
			return Ok(endpoint);
		}

		let scopes = ScopeSet::parse(endpoint.get("scope").unwrap_or_default())
			.with_leading("openid")
			.map_err(ConfigError::from)?;
		let nonce = match endpoint.get("nonce") {
			Some(nonce) => nonce.to_owned(),
			None => random_urlsafe(NONCE_BYTES),
		};

		ctx.store().set_as(keys::OIDC_NONCE, &nonce)?;

		Ok(endpoint.set("scope", scopes.normalized()).set("nonce", nonce))
	}

	fn on_token(&self, ctx: &CallContext, endpoint: TokenEndpoint) -> Result<TokenEndpoint> {
		if !ctx.provider().is_openid() {
			return Ok(endpoint);
		}

		let mut validator = IdTokenValidator::from_config(ctx.config())?;

		if endpoint.get("grant_type") == Some("authorization_code") {
			if let Some(nonce) = ctx.store().take_as::<String>(keys::OIDC_NONCE)? {
				validator = validator.with_nonce(nonce);
			}
		}

		Ok(endpoint.with_listener(Arc::new(validator)))
	}
}

/// Verifies the `id_token` of a token response and attaches it as an [`IdToken`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdTokenValidator {
	required: bool,
	max_skew: Duration,
	nonce: Option<String>,
}
impl IdTokenValidator {
	/// Default accepted age of `iat`.
	pub const DEFAULT_MAX_SKEW: Duration = Duration::seconds(30);

	/// Reads `id_token_required` and `id_token_max_skew`.
	pub fn from_config(config: &ClientConfig) -> Result<Self, ConfigError> {
		Ok(Self {
			required: config.option_bool(options::ID_TOKEN_REQUIRED)?.unwrap_or(false),
			max_skew: config
				.option_seconds(options::ID_TOKEN_MAX_SKEW)?
				.unwrap_or(Self::DEFAULT_MAX_SKEW),
			nonce: None,
		})
	}

	/// Expects `nonce` in the ID Token.
	pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
		self.nonce = Some(nonce.into());

		self
	}

	/// Checks the claims of an already verified ID Token.
	pub fn validate(
		&self,
		claims: &Claims,
		algorithm: Algorithm,
		issuer: &str,
		client_id: &str,
		access_token: Option<&str>,
		now: OffsetDateTime,
	) -> Result<(), ValidationError> {
		for claim in REQUIRED_ID_TOKEN_CLAIMS {
			if !claims.contains(claim) {
				return Err(ValidationError::MissingClaim { claim });
			}
		}

		let found_issuer = claims.str("iss").unwrap_or_default();

		if found_issuer != issuer {
			return Err(mismatch("iss", issuer, found_issuer));
		}
		if claims.is_past("exp", now).unwrap_or(true) {
			return Err(ValidationError::Expired {
				claim: "exp",
				value: claims.i64("exp").unwrap_or_default(),
			});
		}

		let audience = claims.audience();

		if !audience.contains(&client_id) {
			return Err(mismatch("aud", client_id, &audience.join(" ")));
		}
		if audience.len() > 1 && !claims.contains("azp") {
			return Err(ValidationError::MissingClaim { claim: "azp" });
		}
		if claims.contains("azp") {
			let azp = claims.str("azp").unwrap_or_default();

			if azp != client_id {
				return Err(mismatch("azp", client_id, azp));
			}
		}

		let Some(issued_at) = claims.i64("iat") else {
			return Err(ValidationError::MissingClaim { claim: "iat" });
		};

		let oldest = now.checked_sub(self.max_skew).map(OffsetDateTime::unix_timestamp);

		if oldest.is_some_and(|oldest| issued_at < oldest) {
			return Err(ValidationError::IssuedTooLongAgo {
				value: issued_at,
				max_skew: self.max_skew,
			});
		}
		if let Some(expected) = &self.nonce {
			let Some(found) = claims.str("nonce") else {
				return Err(ValidationError::MissingClaim { claim: "nonce" });
			};

			if !constant_time_eq(expected, found) {
				return Err(mismatch("nonce", expected, found));
			}
		}
		if let (Some(found), Some(access_token)) = (claims.get("at_hash"), access_token) {
			let expected = half_hash(algorithm, access_token);
			let found = found.as_str().unwrap_or_default();

			if expected != found {
				return Err(mismatch("at_hash", &expected, found));
			}
		}

		Ok(())
	}
}
impl ResponseListener<TokenResponse> for IdTokenValidator {
	fn on_response<'a>(
		&'a self,
		ctx: &'a CallContext,
		response: TokenResponse,
	) -> EndpointFuture<'a, TokenResponse> {
		Box::pin(async move {
			let Some(raw) = response.id_token_raw() else {
				if self.required {
					return Err(ValidationError::MissingIdToken.into());
				}

				return Ok(response);
			};
			let provider = ctx.provider();
			let secret = ctx.config().client_secret().map(|secret| secret.expose().as_bytes());
			let jwt = provider.codec().decode_with(raw, provider.key_set().await?, secret)?;

			self.validate(
				jwt.claims(),
				jwt.algorithm(),
				provider.issuer(),
				ctx.config().client_id(),
				Some(response.access_token()),
				OffsetDateTime::now_utc(),
			)?;

			Ok(response.with_id_token(IdToken::new(jwt)))
		})
	}
}

fn mismatch(claim: &'static str, expected: &str, found: &str) -> ValidationError {
	ValidationError::ClaimMismatch { claim, expected: expected.to_owned(), found: found.to_owned() }
}

#[cfg(test)]
mod tests {
	// crates.io
	use serde_json::json;
	// self
	use super::*;

	const ISSUER: &str = "https://issuer.example.com";
	const CLIENT: &str = "client-1";

	fn now() -> OffsetDateTime {
		OffsetDateTime::from_unix_timestamp(1_700_000_000).expect("Fixture timestamp is valid.")
	}

	fn claims() -> Claims {
		serde_json::from_value(json!({
			"iss": ISSUER,
			"sub": "user-1",
			"aud": CLIENT,
			"exp": 1_700_000_600,
			"iat": 1_699_999_990,
		}))
		.expect("Claims fixture should deserialize.")
	}

	fn validate(validator: &IdTokenValidator, claims: &Claims) -> Result<(), ValidationError> {
		validator.validate(claims, Algorithm::HS256, ISSUER, CLIENT, Some("access-token"), now())
	}

	fn validator() -> IdTokenValidator {
		IdTokenValidator::from_config(&ClientConfig::new(CLIENT))
			.expect("Default options are valid.")
	}

	#[test]
	fn accepts_well_formed_claims() {
		validate(&validator(), &claims()).expect("Fixture claims should validate.");
	}

	#[test]
	fn each_required_claim_is_enforced() {
		for claim in REQUIRED_ID_TOKEN_CLAIMS {
			let mut map = claims().into_map();

			map.remove(claim);

			let err = validate(&validator(), &Claims::from(map))
				.expect_err("Claims without a required member must fail.");

			assert!(matches!(
				err,
				ValidationError::MissingClaim { claim: found } if found == claim
			));
		}
	}

	#[test]
	fn rejects_foreign_issuers_and_expired_tokens() {
		let err = validate(&validator(), &claims().with("iss", "https://evil.example.com"))
			.expect_err("Foreign issuers must fail.");

		assert!(matches!(err, ValidationError::ClaimMismatch { claim: "iss", .. }));

		let err = validate(&validator(), &claims().with("exp", 1_699_999_000))
			.expect_err("Expired tokens must fail.");

		assert!(matches!(err, ValidationError::Expired { claim: "exp", value: 1_699_999_000 }));
	}

	#[test]
	fn multi_valued_audiences_need_a_matching_azp() {
		let multi = claims().with("aud", json!([CLIENT, "other"]));
		let err = validate(&validator(), &multi).expect_err("Multi-valued aud requires azp.");

		assert!(matches!(err, ValidationError::MissingClaim { claim: "azp" }));

		let err = validate(&validator(), &multi.with("azp", "other"))
			.expect_err("azp must name this client.");

		assert!(matches!(err, ValidationError::ClaimMismatch { claim: "azp", .. }));
		validate(&validator(), &multi.with("azp", CLIENT)).expect("Matching azp should validate.");
	}

	#[test]
	fn stale_iat_respects_configured_skew() {
		let stale = claims().with("iat", 1_699_999_900);
		let err = validate(&validator(), &stale).expect_err("iat older than 30s must fail.");

		assert!(matches!(err, ValidationError::IssuedTooLongAgo { value: 1_699_999_900, .. }));

		let relaxed_config = ClientConfig::new(CLIENT).with_option(options::ID_TOKEN_MAX_SKEW, 300);
		let relaxed =
			IdTokenValidator::from_config(&relaxed_config).expect("Numeric skew is valid.");

		validate(&relaxed, &stale).expect("Stale iat within the configured skew should validate.");
	}

	#[test]
	fn unbounded_skew_accepts_any_iat() {
		let config = ClientConfig::new(CLIENT).with_option(options::ID_TOKEN_MAX_SKEW, i64::MAX);
		let unbounded = IdTokenValidator::from_config(&config).expect("Huge skew is a valid option.");

		validate(&unbounded, &claims()).expect("Fresh iat should validate.");
		validate(&unbounded, &claims().with("iat", 0)).expect("Any iat is within an unbounded skew.");
	}

	#[test]
	fn nonce_and_at_hash_are_checked() {
		let expecting = validator().with_nonce("n-0S6_WzA2Mj");
		let err = validate(&expecting, &claims()).expect_err("Missing nonce must fail.");

		assert!(matches!(err, ValidationError::MissingClaim { claim: "nonce" }));
		validate(&expecting, &claims().with("nonce", "n-0S6_WzA2Mj")).expect("Nonce matches.");

		let err = validate(&validator(), &claims().with("at_hash", "bogus"))
			.expect_err("Mismatched at_hash must fail.");

		assert!(matches!(err, ValidationError::ClaimMismatch { claim: "at_hash", .. }));
		let at_hash = half_hash(Algorithm::HS256, "access-token");

		validate(&validator(), &claims().with("at_hash", at_hash))
			.expect("Matching at_hash should validate.");
	}
}
