//! Inbound adapters that translate external events into domain service calls
//! while keeping transport details at the edge.
//!
//! The serverless entry points live under [`lambda`]; [`http`] wraps the same
//! router in an actix-web server for local development.

pub mod http;
pub mod lambda;
