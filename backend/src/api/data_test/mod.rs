//! Data-test sandbox for checking the configured storage backend end to end.

pub mod handlers;
pub mod routes;
