//! Domain ports and supporting types for the hexagonal boundary.
//!
//! Driven ports (implemented in `outbound`): [`ExpenseRepository`],
//! [`BlobStore`], [`DocumentAnalyzer`]. Driving ports (implemented by the
//! domain services, called from `inbound`): [`ExpenseQuery`],
//! [`ExpenseCommand`], [`ReceiptIngestionCommand`].

mod macros;
pub(crate) use macros::define_port_error;

mod blob_store;
mod document_analyzer;
mod expense_command;
mod expense_repository;
mod receipt_ingestion_command;

#[cfg(test)]
pub use blob_store::MockBlobStore;
pub use blob_store::{BlobMetadata, BlobStore, BlobStoreError};
#[cfg(test)]
pub use document_analyzer::MockDocumentAnalyzer;
pub use document_analyzer::{
    AnalyzedDocument, DocumentAnalyzer, DocumentAnalyzerError, ExpenseAnalysis, ExtractedField,
    ExtractedLineItem,
};
pub use expense_command::{ExpenseCommand, ExpenseQuery};
#[cfg(test)]
pub use expense_command::{MockExpenseCommand, MockExpenseQuery};
#[cfg(test)]
pub use expense_repository::MockExpenseRepository;
pub use expense_repository::{ExpenseRepository, ExpenseRepositoryError};
#[cfg(test)]
pub use receipt_ingestion_command::MockReceiptIngestionCommand;
pub use receipt_ingestion_command::{
    IngestionOutcome, IngestionWarning, ReceiptIngestionCommand,
};
