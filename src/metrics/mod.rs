//! Per-request outcome records produced by the executor.
mod types;

pub use types::{FailureKind, Phases, RequestFailure, RequestResult};
