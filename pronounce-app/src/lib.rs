//! Server shell around the pronunciation lookup: CLI parsing, config
//! overlays and the axum endpoint.

pub mod cli;
pub mod server;
