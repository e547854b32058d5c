//! Database module for the arbor server
//!
//! Credential persistence sits behind the [`CredentialStore`] trait so the
//! auth layer never talks SQL directly. The trees resource is plain
//! request-to-SQL plumbing on [`DbOperations`].

pub mod models;
pub mod operations;
pub mod store;
mod trees;

pub use models::{Tree, TreeInput, TreeType, UserCredential};
pub use operations::DbOperations;
pub use store::{CredentialStore, MemoryCredentialStore};
