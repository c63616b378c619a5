//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **dynamodb**: expense records in a DynamoDB table with an owner index
//! - **memory**: process-local expense store for the development server
//! - **s3**: receipt object metadata
//! - **textract**: expense field extraction
//!
//! Adapters translate between domain types and SDK representations. They
//! contain no business logic.

pub mod dynamodb;
pub mod memory;
pub mod s3;
pub mod textract;
