//! Compact JWS handling: algorithm registry, codec, and the claims container shared by
//! ID Tokens, userinfo, and introspection responses.

pub mod alg;
pub mod claims;
pub mod jwt;

pub use alg::*;
pub use claims::*;
pub use jsonwebtoken::{
	Algorithm, DecodingKey, EncodingKey,
	jwk::{Jwk, JwkSet},
};
pub use jwt::*;
