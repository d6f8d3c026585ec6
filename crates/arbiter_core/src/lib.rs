//! ARBITER Core Types
//!
//! Pure types with no I/O: the decision model shared by every
//! combining algorithm, plus identifiers and the core error type.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod attribute;
pub mod context;
pub mod decision;
pub mod error;
pub mod id;

// Re-exports
pub use attribute::{AttributeAssignment, AttributeValue};
pub use context::EvaluationCtx;
pub use decision::{Decision, Effect, EvalResult, Obligation, Status, StatusCode};
pub use error::{CoreError, CoreResult};
pub use id::{AlgorithmId, RequestId};
