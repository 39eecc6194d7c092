//! Authentication module for the moderation API.
//!
//! Protected routes require the shared API secret in the `Authorization`
//! header. The check is an axum middleware layered onto those routes only.

pub mod errors;
pub mod middleware;

pub use errors::*;
pub use middleware::*;
