//! Local development HTTP adapter.
//!
//! Serves the expense API over actix-web by re-wrapping each request in the
//! direct-invocation envelope and forwarding it through the same
//! [`ExpenseRouter`](crate::inbound::lambda::ExpenseRouter) the serverless
//! entry point uses.

pub mod expenses;
pub mod state;

pub use expenses::configure;
pub use state::HttpState;
