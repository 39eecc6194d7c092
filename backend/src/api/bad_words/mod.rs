//! Administration of the per-language bad words lists.

pub mod handlers;
pub mod routes;
