use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use tenderflow_auth::{Employee, Username};
use tenderflow_core::{
    DomainError, DomainResult, EmployeeId, ExpectedVersion, OrganizationId, TenderId,
};
use tenderflow_tenders::{Bid, BidAuthor, ServiceType, Tender, TenderRevision};

/// Store operation error.
///
/// Infrastructure failures, as opposed to domain errors (validation, lifecycle).
#[derive(Debug, Error)]
pub enum StoreError {
    /// The row a write targeted does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A version-checked write lost against a concurrent writer.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

pub const MAX_PAGE_LIMIT: u32 = 50;

/// Limit/offset window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Page {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    /// Validate raw query parameters, applying `default_limit` when absent.
    pub fn parse(limit: Option<i64>, offset: Option<i64>, default_limit: u32) -> DomainResult<Self> {
        let limit = match limit {
            None => default_limit,
            Some(l) if (0..=i64::from(MAX_PAGE_LIMIT)).contains(&l) => l as u32,
            Some(l) => {
                return Err(DomainError::validation(format!(
                    "limit must be between 0 and {MAX_PAGE_LIMIT}, got {l}"
                )));
            }
        };
        let offset = match offset {
            None => 0,
            Some(o) if o >= 0 => u32::try_from(o)
                .map_err(|_| DomainError::validation(format!("offset {o} is too large")))?,
            Some(o) => {
                return Err(DomainError::validation(format!(
                    "offset must not be negative, got {o}"
                )));
            }
        };
        Ok(Self { limit, offset })
    }

    /// Apply this window to an already-ordered iterator.
    pub fn slice<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset as usize)
            .take(self.limit as usize)
            .collect()
    }
}

/// Public tender listing filter. An empty `service_types` means "all".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenderFilter {
    pub service_types: Vec<ServiceType>,
    pub page: Page,
}

impl TenderFilter {
    pub fn matches(&self, tender: &Tender) -> bool {
        self.service_types.is_empty() || self.service_types.contains(&tender.fields().service_type)
    }
}

/// Persistent state behind the tender service.
///
/// Every method is a single read or a single atomic write; the service composes
/// them and never holds state across calls.
///
/// ## Versioned writes
///
/// `update_tender` is the only mutation of an existing tender. It must compare
/// the stored version with `expected`, write the row, and append the
/// corresponding [`TenderRevision`] in one atomic step. A mismatch fails with
/// [`StoreError::Conflict`] and writes nothing.
#[async_trait]
pub trait TenderStore: Send + Sync {
    async fn find_employee_by_username(&self, username: &Username)
    -> StoreResult<Option<Employee>>;

    async fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool>;

    async fn organization_exists(&self, id: OrganizationId) -> StoreResult<bool>;

    async fn is_organization_responsible(
        &self,
        employee_id: EmployeeId,
        organization_id: OrganizationId,
    ) -> StoreResult<bool>;

    async fn find_tender(&self, id: TenderId) -> StoreResult<Option<Tender>>;

    /// Ordered by name.
    async fn list_tenders(&self, filter: &TenderFilter) -> StoreResult<Vec<Tender>>;

    /// Newest first.
    async fn list_organization_tenders(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> StoreResult<Vec<Tender>>;

    async fn find_revision(&self, id: TenderId, version: u64)
    -> StoreResult<Option<TenderRevision>>;

    /// Oldest first.
    async fn list_revisions(&self, id: TenderId) -> StoreResult<Vec<TenderRevision>>;

    /// Insert a new tender together with its first revision.
    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()>;

    /// Version-checked replace of an existing tender (see trait docs).
    async fn update_tender(&self, tender: &Tender, expected: ExpectedVersion) -> StoreResult<()>;

    async fn insert_bid(&self, bid: &Bid) -> StoreResult<()>;

    /// Newest first.
    async fn list_bids_by_author(&self, author: BidAuthor, page: Page) -> StoreResult<Vec<Bid>>;
}

#[async_trait]
impl<S> TenderStore for Arc<S>
where
    S: TenderStore + ?Sized,
{
    async fn find_employee_by_username(
        &self,
        username: &Username,
    ) -> StoreResult<Option<Employee>> {
        (**self).find_employee_by_username(username).await
    }

    async fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
        (**self).employee_exists(id).await
    }

    async fn organization_exists(&self, id: OrganizationId) -> StoreResult<bool> {
        (**self).organization_exists(id).await
    }

    async fn is_organization_responsible(
        &self,
        employee_id: EmployeeId,
        organization_id: OrganizationId,
    ) -> StoreResult<bool> {
        (**self)
            .is_organization_responsible(employee_id, organization_id)
            .await
    }

    async fn find_tender(&self, id: TenderId) -> StoreResult<Option<Tender>> {
        (**self).find_tender(id).await
    }

    async fn list_tenders(&self, filter: &TenderFilter) -> StoreResult<Vec<Tender>> {
        (**self).list_tenders(filter).await
    }

    async fn list_organization_tenders(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        (**self).list_organization_tenders(organization_id, page).await
    }

    async fn find_revision(
        &self,
        id: TenderId,
        version: u64,
    ) -> StoreResult<Option<TenderRevision>> {
        (**self).find_revision(id, version).await
    }

    async fn list_revisions(&self, id: TenderId) -> StoreResult<Vec<TenderRevision>> {
        (**self).list_revisions(id).await
    }

    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
        (**self).insert_tender(tender).await
    }

    async fn update_tender(&self, tender: &Tender, expected: ExpectedVersion) -> StoreResult<()> {
        (**self).update_tender(tender, expected).await
    }

    async fn insert_bid(&self, bid: &Bid) -> StoreResult<()> {
        (**self).insert_bid(bid).await
    }

    async fn list_bids_by_author(&self, author: BidAuthor, page: Page) -> StoreResult<Vec<Bid>> {
        (**self).list_bids_by_author(author, page).await
    }
}
