//! Tender service: the application-level orchestration over a [`TenderStore`].
//!
//! ```text
//! request (tender id, username, action, payload)
//!   ↓
//! 1. resolve username → employee            (identity.rs)
//!   ↓
//! 2. load tender + responsibility → decide  (evaluator.rs)
//!   ↓
//! 3. pure domain transition, version + 1    (tenderflow-tenders)
//!   ↓
//! 4. version-checked write + history row    (ledger.rs / lifecycle.rs)
//! ```
//!
//! Every call re-reads current state. Nothing is cached between requests, and a
//! lost race in step 4 surfaces as `Conflict` rather than being retried here.

mod error;
mod evaluator;
#[cfg(test)]
pub(crate) mod fixtures;
mod identity;
mod ledger;
mod lifecycle;
mod queries;

use tenderflow_core::AggregateRoot;
use tenderflow_tenders::Tender;

use crate::store::TenderStore;

pub use error::{ErrorCategory, ServiceResult, TenderServiceError};
pub use evaluator::{AuthorizationDecision, AuthorizedTender};

/// Page size for the public tender listing when none is given.
pub const DEFAULT_TENDER_PAGE: u32 = 5;
/// Page size for per-user listings when none is given.
pub const DEFAULT_USER_PAGE: u32 = 10;

#[derive(Debug, Clone)]
pub struct TenderService<S> {
    store: S,
}

impl<S: TenderStore> TenderService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Persist `next`, which must have been derived from `observed`.
    ///
    /// The write only lands if the stored tender is still at `observed`'s
    /// version.
    async fn commit(&self, observed: &Tender, next: Tender) -> ServiceResult<Tender> {
        debug_assert_eq!(next.version(), observed.next_version());

        self.store
            .update_tender(&next, observed.expected_version())
            .await?;

        Ok(next)
    }
}
