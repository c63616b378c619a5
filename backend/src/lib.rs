//! Expense tracking backend.
//!
//! The CRUD router and the receipt ingestion handler live in
//! [`inbound::lambda`]; [`domain`] holds the services and ports they drive and
//! [`outbound`] the managed-service adapters behind those ports.

pub mod domain;
pub mod inbound;
pub mod outbound;
pub mod settings;
pub mod telemetry;

pub use settings::Settings;
