//! Client credentials, scope sets, and client authentication methods.

pub mod method;
pub mod scope;
pub mod secret;

pub use method::*;
pub use scope::*;
pub use secret::*;
