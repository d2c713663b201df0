//! Optional observability helpers for engine operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oidc_engine.operation` with the
//!   `operation` (endpoint kind or discovery) and `stage` (call site) fields.
//! - Enable `metrics` to increment the `oidc_engine_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operation kinds observed by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OperationKind {
	/// Well-known document lookup.
	Discovery,
	/// Authorization redirect construction and callback handling.
	Authorization,
	/// Token endpoint round trip.
	Token,
	/// Revocation endpoint round trip.
	Revocation,
	/// Introspection, remote or local.
	Introspection,
	/// Userinfo endpoint round trip.
	Userinfo,
	/// Any other registered endpoint.
	Generic,
}
impl OperationKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			OperationKind::Discovery => "discovery",
			OperationKind::Authorization => "authorization",
			OperationKind::Token => "token",
			OperationKind::Revocation => "revocation",
			OperationKind::Introspection => "introspection",
			OperationKind::Userinfo => "userinfo",
			OperationKind::Generic => "generic",
		}
	}
}
impl Display for OperationKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an engine operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Wraps `fut` in an operation span and records attempt plus success or failure.
pub(crate) async fn observe<T, Fut>(kind: OperationKind, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	let span = OperationSpan::new(kind, stage);

	record_outcome(kind, Outcome::Attempt);

	let result = span.instrument(fut).await;

	record_outcome(kind, if result.is_ok() { Outcome::Success } else { Outcome::Failure });

	result
}
