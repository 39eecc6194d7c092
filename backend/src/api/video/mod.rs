//! Video moderation API: signed uploads, analysis jobs and service status.

pub mod handlers;
pub mod routes;
