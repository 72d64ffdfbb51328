use tracing::{debug, instrument};

use tenderflow_auth::TenderAction;
use tenderflow_core::{AggregateRoot, ExpectedVersion, TenderId};
use tenderflow_tenders::{Tender, TenderPatch, TenderRevision};

use crate::store::TenderStore;

use super::{AuthorizedTender, ServiceResult, TenderService, TenderServiceError};

impl<S: TenderStore> TenderService<S> {
    /// Apply a partial field edit as a new version.
    ///
    /// `expected_version` lets the caller pin the version it last saw; without
    /// it the version observed during authorization is used.
    #[instrument(skip(self, patch), fields(tender_id = %tender_id), err)]
    pub async fn edit_tender(
        &self,
        tender_id: TenderId,
        username: &str,
        patch: TenderPatch,
        expected_version: Option<u64>,
    ) -> ServiceResult<Tender> {
        let AuthorizedTender { employee, tender } = self
            .authorize_action(tender_id, username, TenderAction::Edit)
            .await?;
        ExpectedVersion::from_option(expected_version).check(tender.version())?;

        let next = tender.edit(&patch)?;
        let saved = self.commit(&tender, next).await?;
        debug!(actor = %employee.username, version = saved.version(), "tender edited");
        Ok(saved)
    }

    /// Restore the fields recorded at `target_version` under a fresh version.
    #[instrument(skip(self), fields(tender_id = %tender_id), err)]
    pub async fn rollback_tender(
        &self,
        tender_id: TenderId,
        target_version: i64,
        username: &str,
    ) -> ServiceResult<Tender> {
        let target = u64::try_from(target_version)
            .ok()
            .filter(|v| *v >= 1)
            .ok_or_else(|| {
                TenderServiceError::ValidationFailed(format!(
                    "version must be at least 1, got {target_version}"
                ))
            })?;

        let AuthorizedTender { employee, tender } = self
            .authorize_action(tender_id, username, TenderAction::Edit)
            .await?;

        let revision = self
            .store
            .find_revision(tender_id, target)
            .await?
            .ok_or_else(|| {
                TenderServiceError::TenderNotFound(format!("{tender_id} at version {target}"))
            })?;

        let next = tender.rollback_to(&revision)?;
        let saved = self.commit(&tender, next).await?;
        debug!(
            actor = %employee.username,
            from = target,
            version = saved.version(),
            "tender rolled back"
        );
        Ok(saved)
    }

    /// Every retained revision, oldest first. Readable by whoever may edit.
    #[instrument(skip(self), fields(tender_id = %tender_id), err)]
    pub async fn tender_history(
        &self,
        tender_id: TenderId,
        username: &str,
    ) -> ServiceResult<Vec<TenderRevision>> {
        self.authorize_action(tender_id, username, TenderAction::Edit)
            .await?;
        Ok(self.store.list_revisions(tender_id).await?)
    }
}
