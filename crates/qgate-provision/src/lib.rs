//! # qgate-provision
//!
//! Materializes a [`Catalog`](qgate_core::Catalog) as a safe schema: one view
//! per entry (omitted columns dropped, sensitive columns rewritten, row
//! filters applied) and a restricted role that can read those views and
//! nothing else.
//!
//! The DDL is rendered by [`ProvisionPlan`] without touching the database
//! and applied by [`SafeSchemaProvisioner`] in a single transaction, so a
//! failed run leaves the previous safe schema in place.

pub mod credentials;
pub mod error;
pub mod plan;
pub mod provisioner;

pub use credentials::Credential;
pub use error::ProvisionError;
pub use plan::{MASK_TEXT, ProvisionPlan, ViewDefinition};
pub use provisioner::{RestrictedPrincipal, SafeSchema, SafeSchemaProvisioner};
