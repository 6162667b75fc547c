//! Storage abstraction for the RBAC administration backend.
//!
//! Backend crates (e.g., rbac-store-sqlite) implement [`Store`] so the server
//! doesn't depend on any specific database engine or schema details.

mod store;
mod types;

pub use store::*;
pub use types::*;

use thiserror::Error;

/// Uniform error type for all storage backends.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("not found")]
    NotFound,
    /// An association list named an id that does not resolve.
    #[error("{entity} {id} not found")]
    MissingReference { entity: &'static str, id: i64 },
    #[error("already exists")]
    AlreadyExists,
    /// A referential constraint rejected the write.
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("backend error: {0}")]
    Backend(String),
}
