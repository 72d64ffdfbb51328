use chrono::Utc;
use tracing::{info, instrument};

use tenderflow_auth::TenderAction;
use tenderflow_core::{AggregateRoot, TenderId};
use tenderflow_tenders::{Tender, TenderDraft, TenderStatus};

use crate::store::TenderStore;

use super::{AuthorizedTender, ServiceResult, TenderService, TenderServiceError};

impl<S: TenderStore> TenderService<S> {
    /// Create a tender on behalf of `creator_username`.
    ///
    /// An unknown creator or organization is reported as `Forbidden`, not as a
    /// not-found.
    #[instrument(
        skip(self, draft),
        fields(organization_id = %draft.organization_id),
        err
    )]
    pub async fn create_tender(
        &self,
        draft: TenderDraft,
        creator_username: &str,
    ) -> ServiceResult<Tender> {
        draft.fields.validate()?;

        let creator = match self.resolve_identity(creator_username).await {
            Ok(employee) => employee,
            Err(TenderServiceError::UserNotFound(name)) => {
                return Err(TenderServiceError::Forbidden(format!(
                    "creator '{name}' does not exist"
                )));
            }
            Err(other) => return Err(other),
        };
        if !self.store.organization_exists(draft.organization_id).await? {
            return Err(TenderServiceError::Forbidden(format!(
                "organization {} does not exist",
                draft.organization_id
            )));
        }

        let tender = Tender::create(TenderId::new(), draft, creator.id, Utc::now())?;
        self.store.insert_tender(&tender).await?;

        info!(
            tender_id = %tender.id_typed(),
            creator = %creator.username,
            "tender created"
        );
        Ok(tender)
    }

    /// Move the tender to `status`, checked with the action for that transition.
    #[instrument(skip(self), fields(tender_id = %tender_id), err)]
    pub async fn change_tender_status(
        &self,
        tender_id: TenderId,
        status: &str,
        username: &str,
    ) -> ServiceResult<Tender> {
        let next_status: TenderStatus = status.parse()?;

        let AuthorizedTender { employee, tender } = self
            .authorize_action(tender_id, username, TenderAction::for_transition(next_status))
            .await?;

        let next = tender.change_status(next_status)?;
        let saved = self.commit(&tender, next).await?;
        info!(
            actor = %employee.username,
            from = %tender.status(),
            to = %saved.status(),
            version = saved.version(),
            "tender status changed"
        );
        Ok(saved)
    }

    /// Current status, visible to whoever may edit the tender.
    #[instrument(skip(self), fields(tender_id = %tender_id), err)]
    pub async fn tender_status(
        &self,
        tender_id: TenderId,
        username: &str,
    ) -> ServiceResult<TenderStatus> {
        let AuthorizedTender { tender, .. } = self
            .authorize_action(tender_id, username, TenderAction::Edit)
            .await?;
        Ok(tender.status())
    }
}
