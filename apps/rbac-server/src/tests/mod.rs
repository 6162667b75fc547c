//! Server tests.
//!
//! Tests are organized into modules by feature area:
//! - `common` - Shared helpers for driving the router
//! - `health` - Liveness and readiness probes
//! - `store_failures` - Backend failures surfaced through a mocked store
//! - `handlers` - Resource endpoint tests against in-memory SQLite


mod handlers;
