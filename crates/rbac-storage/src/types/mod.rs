//! Type definitions for RBAC storage.

mod catalog;
mod groups;
mod ids;
mod permissions;
mod projects;
mod users;

// Re-export all types from submodules
pub use catalog::*;
pub use groups::*;
pub use ids::*;
pub use permissions::*;
pub use projects::*;
pub use users::*;
