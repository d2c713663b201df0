//! Compact JWS codec backed by `jsonwebtoken`.

// std
use std::collections::HashSet;
// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey, Header, Validation,
	jwk::{Jwk, JwkSet, PublicKeyUse},
};
// self
use crate::{
	_prelude::*,
	jose::{AlgorithmSet, Claims, algorithm_name, is_hmac, key_algorithm},
};

/// Failures raised while decoding, verifying, or signing a compact JWS.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// Token is not a well-formed compact serialization.
	#[error("Token is not a well-formed compact JWS: {reason}.")]
	Malformed {
		/// What is wrong with the token.
		reason: &'static str,
	},
	/// Header names an algorithm that is unknown or disabled.
	#[error("Token algorithm `{algorithm}` is not enabled.")]
	AlgorithmNotAllowed {
		/// Algorithm named by the token header.
		algorithm: String,
	},
	/// No key and algorithm combination verifies the signature.
	#[error("No key in the key set verifies the token signature.")]
	NoMatchingKey,
	/// Key material could not be turned into a JWK.
	#[error("Key material is invalid.")]
	InvalidKey {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
	/// Signing failed.
	#[error("Token could not be signed.")]
	Signing {
		/// Underlying signing failure.
		#[source]
		source: jsonwebtoken::errors::Error,
	},
}

/// A decoded and verified compact JWS.
#[derive(Clone, Debug, PartialEq)]
pub struct Jwt {
	encoded: String,
	header: Map<String, Value>,
	algorithm: Algorithm,
	claims: Claims,
}
impl Jwt {
	/// Original compact serialization.
	pub fn encoded(&self) -> &str {
		&self.encoded
	}

	/// Every member of the protected header.
	pub fn header(&self) -> &Map<String, Value> {
		&self.header
	}

	/// Verified signing algorithm.
	pub fn algorithm(&self) -> Algorithm {
		self.algorithm
	}

	/// Header `kid`, if any.
	pub fn key_id(&self) -> Option<&str> {
		self.header.get("kid").and_then(Value::as_str)
	}

	/// Payload claims.
	pub fn claims(&self) -> &Claims {
		&self.claims
	}

	/// Consumes the token and returns its claims.
	pub fn into_claims(self) -> Claims {
		self.claims
	}
}

/// Encodes and verifies compact JWS values against an [`AlgorithmSet`].
///
/// The codec only checks signatures. Claim semantics (`exp`, `aud`, `iss`) belong to the
/// caller, which is why `jsonwebtoken`'s built-in claim validation is switched off.
#[derive(Clone, Debug, Default)]
pub struct JwtCodec {
	algorithms: AlgorithmSet,
}
impl JwtCodec {
	/// Creates a codec restricted to `algorithms`.
	pub fn new(algorithms: AlgorithmSet) -> Self {
		Self { algorithms }
	}

	/// Enabled algorithms.
	pub fn algorithms(&self) -> &AlgorithmSet {
		&self.algorithms
	}

	/// Returns a codec restricted to the JWA names in `names`.
	pub fn filter<I, S>(&self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self { algorithms: self.algorithms.filter(names) }
	}

	/// Decodes `token` and verifies it against `keys`.
	pub fn decode(&self, token: &str, keys: &JwkSet) -> Result<Jwt, DecodeError> {
		self.decode_with(token, keys, None)
	}

	/// Decodes `token`, trying `secret` for `HS*` tokens before the key set.
	pub fn decode_with(
		&self,
		token: &str,
		keys: &JwkSet,
		secret: Option<&[u8]>,
	) -> Result<Jwt, DecodeError> {
		let (header, algorithm) = self.inspect(token)?;
		let kid = header.get("kid").and_then(Value::as_str);
		let mut candidates = Vec::new();

		if let Some(secret) = secret.filter(|_| is_hmac(algorithm)) {
			candidates.push(DecodingKey::from_secret(secret));
		}

		candidates.extend(
			keys.keys
				.iter()
				.filter(|jwk| key_matches(jwk, kid, algorithm))
				.filter_map(|jwk| DecodingKey::from_jwk(jwk).ok()),
		);

		verify(token, header, algorithm, &candidates)
	}

	/// Parses the protected header and resolves its algorithm without verifying anything.
	pub fn inspect(&self, token: &str) -> Result<(Map<String, Value>, Algorithm), DecodeError> {
		let mut segments = token.split('.');
		let (Some(header), Some(payload), Some(signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(DecodeError::Malformed { reason: "expected three segments" });
		};

		if header.is_empty() || payload.is_empty() || signature.is_empty() {
			return Err(DecodeError::Malformed { reason: "empty segment" });
		}

		let header = decode_segment(header, "header is not a base64url JSON object")?;

		decode_segment(payload, "payload is not a base64url JSON object")?;

		let name = header
			.get("alg")
			.and_then(Value::as_str)
			.ok_or(DecodeError::Malformed { reason: "header lacks `alg`" })?;
		let algorithm = self
			.algorithms
			.get(name)
			.ok_or_else(|| DecodeError::AlgorithmNotAllowed { algorithm: name.to_owned() })?;

		Ok((header, algorithm))
	}

	/// Signs `claims` with `key` under `algorithm`.
	pub fn encode(
		&self,
		algorithm: Algorithm,
		key: &EncodingKey,
		key_id: Option<&str>,
		claims: &Claims,
	) -> Result<String, DecodeError> {
		if !self.algorithms.contains(algorithm) {
			return Err(DecodeError::AlgorithmNotAllowed {
				algorithm: algorithm_name(algorithm).to_owned(),
			});
		}

		let mut header = Header::new(algorithm);

		header.kid = key_id.map(ToOwned::to_owned);

		jsonwebtoken::encode(&header, claims.as_map(), key)
			.map_err(|source| DecodeError::Signing { source })
	}
}

/// Builds an `oct` JWK holding `secret`, tagged with `algorithm` and an optional `kid`.
pub fn symmetric_jwk(
	secret: &[u8],
	algorithm: Algorithm,
	key_id: Option<&str>,
) -> Result<Jwk, DecodeError> {
	let mut value = Map::new();

	value.insert("kty".into(), "oct".into());
	value.insert("k".into(), URL_SAFE_NO_PAD.encode(secret).into());
	value.insert("alg".into(), algorithm_name(algorithm).into());

	if let Some(kid) = key_id {
		value.insert("kid".into(), kid.into());
	}

	serde_json::from_value(Value::Object(value))
		.map_err(|source| DecodeError::InvalidKey { source })
}

fn key_matches(jwk: &Jwk, kid: Option<&str>, algorithm: Algorithm) -> bool {
	if let (Some(wanted), Some(actual)) = (kid, jwk.common.key_id.as_deref()) {
		if wanted != actual {
			return false;
		}
	}
	if let Some(alg) = &jwk.common.key_algorithm {
		if key_algorithm(alg) != Some(algorithm) {
			return false;
		}
	}

	!matches!(jwk.common.public_key_use, Some(PublicKeyUse::Encryption))
}

fn verify(
	token: &str,
	header: Map<String, Value>,
	algorithm: Algorithm,
	candidates: &[DecodingKey],
) -> Result<Jwt, DecodeError> {
	let mut validation = Validation::new(algorithm);

	validation.validate_exp = false;
	validation.validate_nbf = false;
	validation.validate_aud = false;
	validation.required_spec_claims = HashSet::new();
	validation.leeway = 0;

	for key in candidates {
		if let Ok(data) = jsonwebtoken::decode::<Map<String, Value>>(token, key, &validation) {
			return Ok(Jwt {
				encoded: token.to_owned(),
				header,
				algorithm,
				claims: Claims::from(data.claims),
			});
		}
	}

	Err(DecodeError::NoMatchingKey)
}

fn decode_segment(segment: &str, reason: &'static str) -> Result<Map<String, Value>, DecodeError> {
	let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|_| DecodeError::Malformed { reason })?;

	serde_json::from_slice(&bytes).map_err(|_| DecodeError::Malformed { reason })
}
