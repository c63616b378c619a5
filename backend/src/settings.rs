//! Runtime configuration loaded via OrthoConfig.
//!
//! Every value can come from the command line or an `EXPENSES_*` environment
//! variable; unset values fall back to the accessor defaults.

use ortho_config::OrthoConfig;
use serde::Deserialize;

use crate::domain::{IngestionOptions, OwnerId, OwnerIdValidationError, ReceiptIdStrategy};
use crate::outbound::dynamodb::DynamoDbTable;

const DEFAULT_TABLE: &str = "Receipts";
const DEFAULT_INDEX_NAME: &str = "userId-date-index";
const DEFAULT_OWNER_METADATA_KEY: &str = "userid";
const DEFAULT_DEV_BIND_ADDR: &str = "127.0.0.1:8080";
const DEFAULT_DEV_USER: &str = "local-dev-user";

/// Configuration shared by the functions and the development server.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "EXPENSES")]
pub struct Settings {
    /// Expense table name.
    pub table: Option<String>,
    /// Secondary index keyed by owner and date.
    pub index_name: Option<String>,
    /// Endpoint override for a local DynamoDB.
    pub dynamodb_endpoint: Option<String>,
    /// Object metadata key naming the uploader.
    pub owner_metadata_key: Option<String>,
    /// Derive ingested receipt ids from the object location.
    #[ortho_config(default = false)]
    pub deterministic_receipt_ids: bool,
    /// Listen address of the development server.
    pub dev_bind_addr: Option<String>,
    /// Identity asserted by the development server.
    pub dev_user: Option<String>,
    /// Back the development server with DynamoDB instead of memory.
    #[ortho_config(default = false)]
    pub dev_use_dynamodb: bool,
}

impl Settings {
    pub fn table_name(&self) -> &str {
        self.table.as_deref().unwrap_or(DEFAULT_TABLE)
    }

    pub fn index_name(&self) -> &str {
        self.index_name.as_deref().unwrap_or(DEFAULT_INDEX_NAME)
    }

    pub fn dynamodb_endpoint(&self) -> Option<&str> {
        self.dynamodb_endpoint
            .as_deref()
            .filter(|endpoint| !endpoint.trim().is_empty())
    }

    pub fn dynamodb_table(&self) -> DynamoDbTable {
        DynamoDbTable {
            table_name: self.table_name().to_owned(),
            owner_index: self.index_name().to_owned(),
        }
    }

    /// Ingestion tunables; the metadata key is lower-cased to match how the
    /// store reports user metadata.
    pub fn ingestion_options(&self) -> IngestionOptions {
        IngestionOptions {
            owner_metadata_key: self
                .owner_metadata_key
                .as_deref()
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .unwrap_or(DEFAULT_OWNER_METADATA_KEY)
                .to_ascii_lowercase(),
            receipt_ids: if self.deterministic_receipt_ids {
                ReceiptIdStrategy::FromBlob
            } else {
                ReceiptIdStrategy::Random
            },
        }
    }

    pub fn dev_bind_addr(&self) -> &str {
        self.dev_bind_addr.as_deref().unwrap_or(DEFAULT_DEV_BIND_ADDR)
    }

    pub fn dev_user(&self) -> Result<OwnerId, OwnerIdValidationError> {
        OwnerId::new(self.dev_user.as_deref().unwrap_or(DEFAULT_DEV_USER))
    }
}
