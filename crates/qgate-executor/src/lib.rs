//! # qgate-executor
//!
//! Runs validated statements through the restricted principal and returns
//! rows plus metadata. Only accepted verdicts are executed; handing over a
//! rejected one is a caller bug.

pub mod error;
pub mod executor;
pub mod row;

pub use error::ExecutorError;
pub use executor::QueryExecutor;
