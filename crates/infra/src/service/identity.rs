use tracing::instrument;

use tenderflow_auth::{Employee, Username};

use crate::store::TenderStore;

use super::{ServiceResult, TenderService, TenderServiceError};

impl<S: TenderStore> TenderService<S> {
    /// Map a username to the employee acting under it.
    ///
    /// Blank usernames are a validation failure; unknown ones are `UserNotFound`.
    #[instrument(skip(self), err)]
    pub async fn resolve_identity(&self, username: &str) -> ServiceResult<Employee> {
        let username = Username::parse(username)?;
        self.store
            .find_employee_by_username(&username)
            .await?
            .ok_or_else(|| TenderServiceError::UserNotFound(username.to_string()))
    }
}
