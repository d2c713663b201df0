//! Built-in extensions: PKCE, OpenID Connect, local JWT introspection, token storage, and
//! scope enforcement.
//!
//! Each type implements [`Extension`](crate::endpoint::Extension); registering it on a
//! [`Client`](crate::client::Client) binds a client-specific transformer. Registration
//! order is significant: token storage should come before scope validation so injected
//! scopes are validated too.

pub mod jwt_introspection;
pub mod oidc;
pub mod pkce;
pub mod scope_validation;
pub mod token_storage;

pub use jwt_introspection::*;
pub use oidc::*;
pub use pkce::*;
pub use scope_validation::*;
pub use token_storage::*;
