//! # qgate-core
//!
//! Types shared by every qgate crate: the catalog model, the sensitivity
//! policy, candidate queries and verdicts, query results, SQL identifier
//! helpers and the gateway configuration.

pub mod catalog;
pub mod config;
pub mod ident;
pub mod policy;
pub mod query;

pub use catalog::{
    AccessMode, CATALOG_FORMAT, Catalog, CatalogDocument, CatalogEntry, ColumnDescriptor,
    ColumnRef, DocumentColumn, DocumentTable, QualifiedName, Relationship,
};
pub use config::{
    CatalogConfig, ConfigError, DatabaseConfig, ExecutionConfig, GatewayConfig, LimitsConfig,
    PoolConfig, SafeSchemaConfig, ValidatorConfig,
};
pub use ident::{IdentError, fold_identifier, is_plain_identifier, quote_ident, quote_literal};
pub use policy::{ColumnRule, PolicyError, RewriteRule, SensitivityPolicy, TablePolicy};
pub use query::{
    CandidateQuery, QueryResult, QuerySource, Rejection, RejectionKind, ValidationVerdict,
};
