//! Resource endpoint tests.
//!
//! Each module drives the router against a fresh in-memory store.

mod groups;
mod permissions;
mod projects;
mod users;
