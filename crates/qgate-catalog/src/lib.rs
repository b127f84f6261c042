//! # qgate-catalog
//!
//! Builds the [`Catalog`](qgate_core::Catalog) of the safe schema: the live
//! source schema is introspected over the admin connection, then filtered
//! and annotated by the operator's sensitivity policy.
//!
//! Introspection is read-only and may run concurrently with query execution.
//! Building is a pure function of (live schema, policy, safe-schema layout).

pub mod builder;
pub mod error;
pub mod introspect;
pub mod render;

pub use builder::CatalogBuilder;
pub use error::CatalogError;
pub use introspect::{
    ForeignKey, ForeignKeyMapping, LiveColumn, LiveSchema, LiveTable, PgIntrospector,
    SchemaIntrospector,
};
pub use render::render_markdown;
