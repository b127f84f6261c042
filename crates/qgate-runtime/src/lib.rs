//! # qgate-runtime
//!
//! Ties the catalog builder, provisioner, validator and executor together
//! behind a [`Gateway`] holding the current snapshot. Validation always runs
//! against the snapshot's catalog and execution refuses verdicts from a
//! different catalog version, so a reprovisioning between the two is caught.

pub mod audit;
pub mod error;
pub mod gateway;

pub use audit::{AuditAction, AuditEvent, AuditSink, MemoryAuditSink, TracingAuditSink};
pub use error::GatewayError;
pub use gateway::{Gateway, QueryOutcome, RefreshOutcome, Snapshot};
