//! Shared HTTP adapter state.
//!
//! Handlers accept this state via `actix_web::web::Data`; they only depend on
//! the router and the identity the dev server asserts for every request.

use crate::domain::OwnerId;
use crate::inbound::lambda::ExpenseRouter;

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub router: ExpenseRouter,
    /// Subject placed in the authoriser context of forwarded requests.
    pub dev_user: OwnerId,
}

impl HttpState {
    pub fn new(router: ExpenseRouter, dev_user: OwnerId) -> Self {
        Self { router, dev_user }
    }
}
