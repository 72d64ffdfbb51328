//! Employee and organization directory loaded into the in-memory store.
//!
//! Postgres deployments own these tables; the in-memory backend starts empty,
//! so dev runs point `DEMO_DIRECTORY` at a JSON file shaped like:
//!
//! ```json
//! {
//!   "organizations": [
//!     { "name": "Acme", "responsible": ["alice"], "members": ["carol"] }
//!   ],
//!   "employees": ["dave"]
//! }
//! ```

use anyhow::Context;
use serde::Deserialize;

use super::in_memory::InMemoryTenderStore;
use super::r#trait::StoreResult;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DirectorySeed {
    #[serde(default)]
    pub organizations: Vec<SeedOrganization>,
    /// Employees without an organization.
    #[serde(default)]
    pub employees: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedOrganization {
    pub name: String,
    /// Members that are also responsible for the organization.
    #[serde(default)]
    pub responsible: Vec<String>,
    #[serde(default)]
    pub members: Vec<String>,
}

impl DirectorySeed {
    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        serde_json::from_str(raw).context("invalid directory seed")
    }

    pub fn employee_count(&self) -> usize {
        self.employees.len()
            + self
                .organizations
                .iter()
                .map(|o| o.responsible.len() + o.members.len())
                .sum::<usize>()
    }
}

impl InMemoryTenderStore {
    /// Register every organization and employee in `seed`.
    ///
    /// Usernames are unique across the whole directory; a repeat is a `Conflict`.
    pub fn seed_directory(&self, seed: &DirectorySeed) -> StoreResult<()> {
        for org in &seed.organizations {
            let org_id = self.add_organization(org.name.clone())?;
            for username in &org.responsible {
                let employee = self.add_employee(username, Some(org_id))?;
                self.add_responsible(employee.id, org_id)?;
            }
            for username in &org.members {
                self.add_employee(username, Some(org_id))?;
            }
        }
        for username in &seed.employees {
            self.add_employee(username, None)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{StoreError, TenderStore};
    use tenderflow_auth::Username;

    const DEMO: &str = r#"{
        "organizations": [
            { "name": "Acme", "responsible": ["alice"], "members": ["carol"] }
        ],
        "employees": ["dave"]
    }"#;

    #[tokio::test]
    async fn seeded_directory_resolves_users_and_responsibility() {
        let seed = DirectorySeed::from_json(DEMO).unwrap();
        assert_eq!(seed.employee_count(), 3);

        let store = InMemoryTenderStore::new();
        store.seed_directory(&seed).unwrap();

        let alice = store
            .find_employee_by_username(&Username::parse("alice").unwrap())
            .await
            .unwrap()
            .unwrap();
        let org = alice.organization_id.unwrap();
        assert!(store.is_organization_responsible(alice.id, org).await.unwrap());

        let carol = store
            .find_employee_by_username(&Username::parse("carol").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(carol.organization_id, Some(org));
        assert!(!store.is_organization_responsible(carol.id, org).await.unwrap());

        let dave = store
            .find_employee_by_username(&Username::parse("dave").unwrap())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(dave.organization_id, None);
    }

    #[test]
    fn repeated_username_is_a_conflict() {
        let seed = DirectorySeed::from_json(
            r#"{ "organizations": [{ "name": "Acme", "responsible": ["alice"], "members": ["alice"] }] }"#,
        )
        .unwrap();
        let err = InMemoryTenderStore::new().seed_directory(&seed).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(DirectorySeed::from_json(r#"{ "orgs": [] }"#).is_err());
    }
}
