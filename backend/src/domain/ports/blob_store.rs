//! Port for reading uploaded receipt metadata from the blob store.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::BlobLocator;

use super::define_port_error;

define_port_error! {
    /// Errors raised by blob store adapters.
    pub enum BlobStoreError {
        /// The object does not exist or access was denied.
        Unreachable { locator: String, message: String } =>
            "could not access object {locator}: {message}",
        /// The store could not be reached.
        Connection { message: String } =>
            "blob store connection failed: {message}",
    }
}

/// User-defined metadata attached to a stored object.
///
/// Keys are lower-cased by the adapter, matching how the store reports them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BlobMetadata {
    pub user_metadata: HashMap<String, String>,
}

impl BlobMetadata {
    /// Non-blank value stored under `key` (case-insensitive).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.user_metadata
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Port for blob existence and metadata checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Fetch metadata of the object, confirming it is reachable.
    async fn head(&self, locator: &BlobLocator) -> Result<BlobMetadata, BlobStoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("userid", Some("abc"))]
    #[case("UserId", Some("abc"))]
    #[case("owner", None)]
    fn metadata_lookup_is_case_insensitive(#[case] key: &str, #[case] expected: Option<&str>) {
        let metadata = BlobMetadata {
            user_metadata: HashMap::from([("userid".to_owned(), "abc".to_owned())]),
        };
        assert_eq!(metadata.get(key), expected);
    }

    #[rstest]
    fn blank_values_count_as_absent() {
        let metadata = BlobMetadata {
            user_metadata: HashMap::from([("userid".to_owned(), " ".to_owned())]),
        };
        assert_eq!(metadata.get("userid"), None);
    }
}
