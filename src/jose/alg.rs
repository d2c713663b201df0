//! Algorithm registry and algorithm-dependent hashing helpers.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, jwk::KeyAlgorithm};
use sha2::{Digest, Sha256, Sha384, Sha512};
// self
use crate::_prelude::*;

/// Every JWS algorithm the codec knows how to verify.
pub const ALL_ALGORITHMS: [Algorithm; 12] = [
	Algorithm::HS256,
	Algorithm::HS384,
	Algorithm::HS512,
	Algorithm::RS256,
	Algorithm::RS384,
	Algorithm::RS512,
	Algorithm::PS256,
	Algorithm::PS384,
	Algorithm::PS512,
	Algorithm::ES256,
	Algorithm::ES384,
	Algorithm::EdDSA,
];

/// Immutable set of enabled JWS algorithms.
///
/// Restricting a set never mutates it; [`filter`](Self::filter) and
/// [`restrict`](Self::restrict) return new projections so one registry can be shared by
/// the ID Token validator and client authentication without interference.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AlgorithmSet {
	algorithms: Vec<Algorithm>,
}
impl AlgorithmSet {
	/// All algorithms in [`ALL_ALGORITHMS`].
	pub fn all() -> Self {
		Self { algorithms: ALL_ALGORITHMS.to_vec() }
	}

	/// No algorithms; every decode fails.
	pub fn empty() -> Self {
		Self { algorithms: Vec::new() }
	}

	/// Returns the subset whose JWA names appear in `names`; unknown names are ignored.
	pub fn filter<I, S>(&self, names: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let wanted =
			names.into_iter().filter_map(|name| parse_algorithm(name.as_ref())).collect::<Vec<_>>();

		self.restrict(&wanted)
	}

	/// Returns the intersection with `allowed`, keeping this set's order.
	pub fn restrict(&self, allowed: &[Algorithm]) -> Self {
		Self {
			algorithms: self
				.algorithms
				.iter()
				.copied()
				.filter(|alg| allowed.contains(alg))
				.collect(),
		}
	}

	/// Returns the HMAC-only subset.
	pub fn hmac(&self) -> Self {
		Self { algorithms: self.algorithms.iter().copied().filter(|alg| is_hmac(*alg)).collect() }
	}

	/// Looks up an enabled algorithm by its JWA name.
	pub fn get(&self, name: &str) -> Option<Algorithm> {
		parse_algorithm(name).filter(|alg| self.contains(*alg))
	}

	/// Returns true when `alg` is enabled.
	pub fn contains(&self, alg: Algorithm) -> bool {
		self.algorithms.contains(&alg)
	}

	/// Returns true when nothing is enabled.
	pub fn is_empty(&self) -> bool {
		self.algorithms.is_empty()
	}

	/// Enabled algorithms in preference order.
	pub fn iter(&self) -> impl Iterator<Item = Algorithm> + '_ {
		self.algorithms.iter().copied()
	}
}
impl Default for AlgorithmSet {
	fn default() -> Self {
		Self::all()
	}
}

/// Returns the JWA name of `alg`.
pub const fn algorithm_name(alg: Algorithm) -> &'static str {
	match alg {
		Algorithm::HS256 => "HS256",
		Algorithm::HS384 => "HS384",
		Algorithm::HS512 => "HS512",
		Algorithm::RS256 => "RS256",
		Algorithm::RS384 => "RS384",
		Algorithm::RS512 => "RS512",
		Algorithm::PS256 => "PS256",
		Algorithm::PS384 => "PS384",
		Algorithm::PS512 => "PS512",
		Algorithm::ES256 => "ES256",
		Algorithm::ES384 => "ES384",
		Algorithm::EdDSA => "EdDSA",
	}
}

/// Parses a JWA name into a known algorithm.
pub fn parse_algorithm(name: &str) -> Option<Algorithm> {
	ALL_ALGORITHMS.into_iter().find(|alg| algorithm_name(*alg) == name)
}

/// Maps a JWK `alg` member onto a signing algorithm; key-management algorithms map to `None`.
pub fn key_algorithm(alg: &KeyAlgorithm) -> Option<Algorithm> {
	match serde_json::to_value(alg).ok()? {
		Value::String(name) => parse_algorithm(&name),
		_ => None,
	}
}

/// Returns true for the `HS*` family.
pub const fn is_hmac(alg: Algorithm) -> bool {
	matches!(alg, Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512)
}

/// Minimum HMAC key length in bytes (the hash output size), or `None` for non-HMAC algorithms.
pub const fn hmac_key_len(alg: Algorithm) -> Option<usize> {
	match alg {
		Algorithm::HS256 => Some(32),
		Algorithm::HS384 => Some(48),
		Algorithm::HS512 => Some(64),
		_ => None,
	}
}

/// Computes the OIDC half hash (`at_hash`/`c_hash`) of `input` for `alg`.
///
/// The digest matches the algorithm's hash size; `EdDSA` uses SHA-512.
pub fn half_hash(alg: Algorithm, input: &str) -> String {
	let digest = match alg {
		Algorithm::HS256 | Algorithm::RS256 | Algorithm::PS256 | Algorithm::ES256 =>
			Sha256::digest(input.as_bytes()).to_vec(),
		Algorithm::HS384 | Algorithm::RS384 | Algorithm::PS384 | Algorithm::ES384 =>
			Sha384::digest(input.as_bytes()).to_vec(),
		Algorithm::HS512 | Algorithm::RS512 | Algorithm::PS512 | Algorithm::EdDSA =>
			Sha512::digest(input.as_bytes()).to_vec(),
	};

	URL_SAFE_NO_PAD.encode(&digest[..digest.len() / 2])
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn filter_is_a_projection() {
		let all = AlgorithmSet::all();
		let restricted = all.filter(["RS256", "HS256", "none"]);

		assert_eq!(restricted.iter().collect::<Vec<_>>(), vec![Algorithm::HS256, Algorithm::RS256]);
		assert_eq!(all.iter().count(), ALL_ALGORITHMS.len(), "Source set must stay intact.");
		assert!(restricted.get("RS384").is_none());
		assert!(all.filter(["none"]).is_empty());
	}

	#[test]
	fn hmac_subset_and_key_lengths() {
		let hmac = AlgorithmSet::all().hmac();

		assert_eq!(hmac.iter().collect::<Vec<_>>(), vec![
			Algorithm::HS256,
			Algorithm::HS384,
			Algorithm::HS512
		]);
		assert_eq!(hmac_key_len(Algorithm::HS384), Some(48));
		assert_eq!(hmac_key_len(Algorithm::RS256), None);
	}

	#[test]
	fn half_hash_matches_oidc_example() {
		// OpenID Connect Core, appendix A.3.
		assert_eq!(
			half_hash(Algorithm::RS256, "jHkWEdUXMU1BwAsC4vtUsZwnNvTIxEl0z9K3vx5KF0Y"),
			"77QmUPtjPfzWtF2AnpK9RQ"
		);
		assert_eq!(half_hash(Algorithm::HS512, "token").len(), 43);
	}

	#[test]
	fn key_algorithms_map_to_signing_algorithms() {
		assert_eq!(key_algorithm(&KeyAlgorithm::RS256), Some(Algorithm::RS256));
		assert_eq!(key_algorithm(&KeyAlgorithm::RSA_OAEP), None);
	}
}
