//! Read-side listings and bid placement. None of these touch tender versions.

use chrono::Utc;
use tracing::{info, instrument};

use tenderflow_core::BidId;
use tenderflow_tenders::{Bid, BidAuthor, BidDraft, ServiceType, Tender};

use crate::store::{Page, TenderFilter, TenderStore};

use super::{ServiceResult, TenderService, TenderServiceError};

impl<S: TenderStore> TenderService<S> {
    /// Public listing, ordered by name. An empty `service_types` lists all.
    #[instrument(skip(self), err)]
    pub async fn list_tenders(
        &self,
        service_types: Vec<ServiceType>,
        page: Page,
    ) -> ServiceResult<Vec<Tender>> {
        let filter = TenderFilter {
            service_types,
            page,
        };
        Ok(self.store.list_tenders(&filter).await?)
    }

    /// Tenders of the user's organization, newest first.
    #[instrument(skip(self), err)]
    pub async fn user_tenders(&self, username: &str, page: Page) -> ServiceResult<Vec<Tender>> {
        let employee = self.resolve_identity(username).await?;
        match employee.organization_id {
            Some(organization_id) => Ok(self
                .store
                .list_organization_tenders(organization_id, page)
                .await?),
            None => Ok(Vec::new()),
        }
    }

    #[instrument(skip(self, draft), fields(tender_id = %draft.tender_id), err)]
    pub async fn create_bid(&self, draft: BidDraft) -> ServiceResult<Bid> {
        if self.store.find_tender(draft.tender_id).await?.is_none() {
            return Err(TenderServiceError::TenderNotFound(draft.tender_id.to_string()));
        }
        match draft.author {
            BidAuthor::User(id) => {
                if !self.store.employee_exists(id).await? {
                    return Err(TenderServiceError::UserNotFound(id.to_string()));
                }
            }
            BidAuthor::Organization(id) => {
                if !self.store.organization_exists(id).await? {
                    return Err(TenderServiceError::ValidationFailed(format!(
                        "organization {id} does not exist"
                    )));
                }
            }
        }

        let bid = Bid::create(BidId::new(), draft, Utc::now())?;
        self.store.insert_bid(&bid).await?;
        info!(bid_id = %bid.id, author_type = bid.author.author_type().as_str(), "bid created");
        Ok(bid)
    }

    /// Bids the user authored personally, newest first.
    #[instrument(skip(self), err)]
    pub async fn user_bids(&self, username: &str, page: Page) -> ServiceResult<Vec<Bid>> {
        let employee = self.resolve_identity(username).await?;
        Ok(self
            .store
            .list_bids_by_author(BidAuthor::User(employee.id), page)
            .await?)
    }
}
