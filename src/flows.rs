//! Grant orchestration on top of the endpoint registry.

pub mod auth_code;

mod grants;

pub use auth_code::*;
