use tracing::{info, instrument};

use tenderflow_auth::{
    AccessContext, AuthorizationExplanation, Employee, TenderAction, explain_authorization,
};
use tenderflow_core::{AggregateRoot, TenderId};
use tenderflow_tenders::Tender;

use crate::store::TenderStore;

use super::{ServiceResult, TenderService, TenderServiceError};

/// Answer to "may this user perform this action on this tender right now?".
#[derive(Debug, Clone)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub explanation: AuthorizationExplanation,
    /// Version the decision was computed against.
    pub tender_version: u64,
}

/// A tender the caller has been cleared to act on, as it was when checked.
#[derive(Debug, Clone)]
pub struct AuthorizedTender {
    pub employee: Employee,
    pub tender: Tender,
}

impl<S: TenderStore> TenderService<S> {
    /// Evaluate `action` for `username` against the current tender state.
    ///
    /// A denial is a successful answer here (`allowed == false`); errors are
    /// reserved for unknown actions, users and tenders.
    #[instrument(skip(self), fields(tender_id = %tender_id), err)]
    pub async fn authorize(
        &self,
        tender_id: TenderId,
        username: &str,
        action: &str,
    ) -> ServiceResult<AuthorizationDecision> {
        let action: TenderAction = action.parse()?;
        let employee = self.resolve_identity(username).await?;
        let tender = self.load_tender(tender_id).await?;
        let ctx = self.access_context(&employee, &tender).await?;

        let explanation = explain_authorization(&employee, action, ctx);
        Ok(AuthorizationDecision {
            allowed: explanation.granted,
            explanation,
            tender_version: tender.version(),
        })
    }

    /// Resolve, load and check in one go; `Forbidden` on denial.
    pub(crate) async fn authorize_action(
        &self,
        tender_id: TenderId,
        username: &str,
        action: TenderAction,
    ) -> ServiceResult<AuthorizedTender> {
        let employee = self.resolve_identity(username).await?;
        let tender = self.load_tender(tender_id).await?;
        let ctx = self.access_context(&employee, &tender).await?;

        if let Err(denied) = tenderflow_auth::authorize(action, ctx) {
            info!(
                tender_id = %tender_id,
                username = %employee.username,
                action = %action,
                status = %ctx.status,
                "tender action denied"
            );
            return Err(denied.into());
        }

        Ok(AuthorizedTender { employee, tender })
    }

    pub(crate) async fn load_tender(&self, tender_id: TenderId) -> ServiceResult<Tender> {
        self.store
            .find_tender(tender_id)
            .await?
            .ok_or_else(|| TenderServiceError::TenderNotFound(tender_id.to_string()))
    }

    async fn access_context(
        &self,
        employee: &Employee,
        tender: &Tender,
    ) -> ServiceResult<AccessContext> {
        let is_responsible = self
            .store
            .is_organization_responsible(employee.id, tender.organization_id())
            .await?;
        Ok(AccessContext {
            status: tender.status(),
            is_responsible,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::super::fixtures::Fixture;
    use super::*;
    use tenderflow_auth::DenialKind;

    #[tokio::test]
    async fn responsible_employee_may_close() {
        let fx = Fixture::new();
        let tender = fx.created_tender().await;

        let decision = fx
            .service
            .authorize(tender.id_typed(), "owner", "close")
            .await
            .unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.tender_version, 1);
    }

    #[tokio::test]
    async fn outsider_edit_on_created_tender_is_denied_with_explanation() {
        let fx = Fixture::new();
        let tender = fx.created_tender().await;

        let decision = fx
            .service
            .authorize(tender.id_typed(), "outsider", "EDIT")
            .await
            .unwrap();
        assert!(!decision.allowed);
        let denial = decision.explanation.denial_reason.unwrap();
        assert_eq!(denial.kind, DenialKind::NotPublished);
        assert!(!denial.suggestions.is_empty());
    }

    #[tokio::test]
    async fn unknown_action_is_rejected_before_lookups() {
        let fx = Fixture::new();
        let err = fx
            .service
            .authorize(TenderId::new(), "nobody", "delete")
            .await
            .unwrap_err();
        assert_eq!(err, TenderServiceError::InvalidAction("delete".into()));
    }

    #[tokio::test]
    async fn unknown_user_is_reported_before_missing_tender() {
        let fx = Fixture::new();
        let err = fx
            .service
            .authorize(TenderId::new(), "nobody", "publish")
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::UserNotFound(_)));
    }

    #[tokio::test]
    async fn missing_tender_is_not_found() {
        let fx = Fixture::new();
        let err = fx
            .service
            .authorize(TenderId::new(), "owner", "publish")
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::TenderNotFound(_)));
    }

    #[tokio::test]
    async fn authorize_action_denial_is_forbidden() {
        let fx = Fixture::new();
        let tender = fx.created_tender().await;
        let err = fx
            .service
            .authorize_action(tender.id_typed(), "outsider", TenderAction::Close)
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::Forbidden(_)));
    }
}
