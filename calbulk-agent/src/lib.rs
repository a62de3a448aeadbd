//! Library surface of the calbulk agent, exposed for integration tests
//! and embedders that want the client without the protocol loop.

pub mod api;
pub mod auth;
pub mod batch;
pub mod config;
pub mod types;
