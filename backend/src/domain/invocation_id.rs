//! Invocation-scoped identifier for correlation across logs and errors.
//!
//! The dispatcher hands every invocation a request id. Inbound adapters put it
//! in task-local storage with [`InvocationId::scope`] so domain errors can pick
//! it up without threading it through every call.
//!
//! Tokio task-local variables are not inherited across spawned tasks. Wrap any
//! spawned work in [`InvocationId::scope`] again.

use std::future::Future;

use tokio::task_local;
use uuid::Uuid;

task_local! {
    static INVOCATION_ID: InvocationId;
}

/// Per-invocation identifier exposed via task-local storage.
///
/// # Examples
/// ```
/// use receipts::domain::InvocationId;
///
/// async fn handler() {
///     if let Some(id) = InvocationId::current() {
///         tracing::info!(invocation_id = %id, "handling");
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationId(Uuid);

impl InvocationId {
    /// Generate a new random identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Adopt the dispatcher's request id, or mint one when it is not a UUID.
    #[must_use]
    pub fn from_request_id(request_id: &str) -> Self {
        request_id.parse().unwrap_or_else(|_| Self::generate())
    }

    /// Returns the current identifier if one is in scope.
    #[must_use]
    #[rustfmt::skip]
    pub fn current() -> Option<Self> { INVOCATION_ID.try_with(|id| *id).ok() }

    /// Execute the provided future with the supplied identifier in scope.
    pub async fn scope<Fut>(id: Self, fut: Fut) -> Fut::Output
    where
        Fut: Future,
    {
        INVOCATION_ID.scope(id, fut).await
    }
}

impl std::fmt::Display for InvocationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for InvocationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}
