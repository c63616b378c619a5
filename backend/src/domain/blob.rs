//! Location of an uploaded receipt image in the blob store.

use std::fmt;

use super::Error;

/// Bucket and (decoded) object key of a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobLocator {
    bucket: String,
    key: String,
}

impl BlobLocator {
    /// Build a locator from an already decoded key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Build a locator from a storage notification, whose object keys are
    /// form-encoded (`+` for space, `%XX` escapes).
    ///
    /// # Examples
    /// ```
    /// use receipts::domain::BlobLocator;
    ///
    /// let locator = BlobLocator::from_notification("receipts", "uploads/Jan+2024%2Fa.jpg")?;
    /// assert_eq!(locator.key(), "uploads/Jan 2024/a.jpg");
    /// # Ok::<(), receipts::domain::Error>(())
    /// ```
    pub fn from_notification(bucket: &str, encoded_key: &str) -> Result<Self, Error> {
        if bucket.trim().is_empty() {
            return Err(Error::invalid_request("storage event is missing a bucket name"));
        }
        let spaced = encoded_key.replace('+', " ");
        let key = urlencoding::decode(&spaced).map_err(|err| {
            Error::invalid_request("storage event object key is not valid UTF-8").caused_by(err)
        })?;
        if key.is_empty() {
            return Err(Error::invalid_request("storage event is missing an object key"));
        }
        Ok(Self::new(bucket, key.into_owned()))
    }

    /// Bucket name.
    pub fn bucket(&self) -> &str {
        self.bucket.as_str()
    }

    /// Decoded object key.
    pub fn key(&self) -> &str {
        self.key.as_str()
    }

    /// `s3://bucket/key` form recorded on ingested expenses.
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl fmt::Display for BlobLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}
