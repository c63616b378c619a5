//! S3-backed `BlobStore`.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_s3::operation::head_object::HeadObjectError;
use tracing::debug;

use crate::domain::BlobLocator;
use crate::domain::ports::{BlobMetadata, BlobStore, BlobStoreError};

/// Reads object metadata with `HeadObject`.
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
}

impl fmt::Debug for S3BlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3BlobStore").finish_non_exhaustive()
    }
}

impl S3BlobStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self::from_client(Client::new(sdk_config))
    }

    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

/// Lower-case user metadata keys the way the store reports them.
fn normalise_metadata<'a>(
    entries: impl IntoIterator<Item = (&'a String, &'a String)>,
) -> BlobMetadata {
    BlobMetadata {
        user_metadata: entries
            .into_iter()
            .map(|(key, value)| (key.to_ascii_lowercase(), value.clone()))
            .collect(),
    }
}

fn map_head_error<R: fmt::Debug>(
    locator: &BlobLocator,
    err: &SdkError<HeadObjectError, R>,
) -> BlobStoreError {
    debug!(%locator, error = %DisplayErrorContext(err), "HeadObject failed");
    match err {
        SdkError::ServiceError(service) => {
            let inner = service.err();
            let message = if inner.is_not_found() {
                "object not found".to_owned()
            } else {
                inner
                    .message()
                    .or_else(|| inner.code())
                    .unwrap_or("access denied")
                    .to_owned()
            };
            BlobStoreError::unreachable(locator.to_string(), message)
        }
        _ => BlobStoreError::connection(DisplayErrorContext(err).to_string()),
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    async fn head(&self, locator: &BlobLocator) -> Result<BlobMetadata, BlobStoreError> {
        let output = self
            .client
            .head_object()
            .bucket(locator.bucket())
            .key(locator.key())
            .send()
            .await
            .map_err(|err| map_head_error(locator, &err))?;
        Ok(output
            .metadata()
            .map(normalise_metadata)
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;
    use rstest::rstest;

    #[rstest]
    fn metadata_keys_are_lower_cased() {
        let raw = HashMap::from([("UserId".to_owned(), "abc".to_owned())]);
        let metadata = normalise_metadata(&raw);
        assert_eq!(metadata.get("userid"), Some("abc"));
        assert!(metadata.user_metadata.contains_key("userid"));
    }
}
