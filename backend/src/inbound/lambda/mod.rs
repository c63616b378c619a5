//! Serverless inbound adapter.
//!
//! The API dispatcher hands over JSON events of several envelope shapes; the
//! storage service hands over object-created notifications. Both are answered
//! with a [`ResponseEnvelope`].

pub mod envelope;
pub mod identity;
pub mod receipts;
mod requests;
pub mod response;
pub mod router;

pub use envelope::{Envelope, EnvelopeShape, NormalizedRequest};
pub use identity::{IdentitySource, caller_identity};
pub use receipts::{ReceiptEventHandler, storage_locators};
pub use response::ResponseEnvelope;
pub use router::ExpenseRouter;
