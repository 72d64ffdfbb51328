use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use tenderflow_auth::{Employee, Username};
use tenderflow_core::{
    AggregateRoot, EmployeeId, ExpectedVersion, OrganizationId, TenderId,
};
use tenderflow_tenders::{Bid, BidAuthor, Tender, TenderRevision};

use super::r#trait::{Page, StoreError, StoreResult, TenderFilter, TenderStore};

#[derive(Debug, Default)]
struct State {
    employees: HashMap<EmployeeId, Employee>,
    organizations: HashMap<OrganizationId, String>,
    responsibilities: HashSet<(EmployeeId, OrganizationId)>,
    tenders: HashMap<TenderId, Tender>,
    // Keyed by version so history iterates oldest first.
    revisions: HashMap<TenderId, BTreeMap<u64, TenderRevision>>,
    bids: Vec<Bid>,
}

/// In-memory tender store.
///
/// Intended for tests/dev. A single lock guards all tables so a tender row and
/// its revision are always written together.
#[derive(Debug, Default)]
pub struct InMemoryTenderStore {
    state: RwLock<State>,
}

impl InMemoryTenderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("lock poisoned")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unexpected(anyhow::anyhow!("lock poisoned")))
    }

    // ── Directory seeding (employees and organizations are managed elsewhere
    //    in production; tests and dev mode register them here).

    pub fn add_organization(&self, name: impl Into<String>) -> StoreResult<OrganizationId> {
        let id = OrganizationId::new();
        self.write()?.organizations.insert(id, name.into());
        Ok(id)
    }

    pub fn add_employee(
        &self,
        username: &str,
        organization_id: Option<OrganizationId>,
    ) -> StoreResult<Employee> {
        let username = Username::parse(username)
            .map_err(|e| StoreError::Unexpected(anyhow::anyhow!(e)))?;
        let mut state = self.write()?;
        if state.employees.values().any(|e| e.username == username) {
            return Err(StoreError::Conflict(format!("username '{username}' is taken")));
        }
        let employee = Employee {
            id: EmployeeId::new(),
            username,
            organization_id,
        };
        state.employees.insert(employee.id, employee.clone());
        Ok(employee)
    }

    pub fn add_responsible(
        &self,
        employee_id: EmployeeId,
        organization_id: OrganizationId,
    ) -> StoreResult<()> {
        self.write()?
            .responsibilities
            .insert((employee_id, organization_id));
        Ok(())
    }
}

#[async_trait]
impl TenderStore for InMemoryTenderStore {
    async fn find_employee_by_username(
        &self,
        username: &Username,
    ) -> StoreResult<Option<Employee>> {
        let state = self.read()?;
        Ok(state
            .employees
            .values()
            .find(|e| &e.username == username)
            .cloned())
    }

    async fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
        Ok(self.read()?.employees.contains_key(&id))
    }

    async fn organization_exists(&self, id: OrganizationId) -> StoreResult<bool> {
        Ok(self.read()?.organizations.contains_key(&id))
    }

    async fn is_organization_responsible(
        &self,
        employee_id: EmployeeId,
        organization_id: OrganizationId,
    ) -> StoreResult<bool> {
        Ok(self
            .read()?
            .responsibilities
            .contains(&(employee_id, organization_id)))
    }

    async fn find_tender(&self, id: TenderId) -> StoreResult<Option<Tender>> {
        Ok(self.read()?.tenders.get(&id).cloned())
    }

    async fn list_tenders(&self, filter: &TenderFilter) -> StoreResult<Vec<Tender>> {
        let state = self.read()?;
        let mut matching: Vec<&Tender> = state
            .tenders
            .values()
            .filter(|t| filter.matches(t))
            .collect();
        matching.sort_by(|a, b| {
            a.fields()
                .name
                .cmp(&b.fields().name)
                .then_with(|| a.id_typed().cmp(&b.id_typed()))
        });
        Ok(filter.page.slice(matching.into_iter().cloned()))
    }

    async fn list_organization_tenders(
        &self,
        organization_id: OrganizationId,
        page: Page,
    ) -> StoreResult<Vec<Tender>> {
        let state = self.read()?;
        let mut owned: Vec<&Tender> = state
            .tenders
            .values()
            .filter(|t| t.organization_id() == organization_id)
            .collect();
        owned.sort_by(|a, b| {
            b.created_at()
                .cmp(&a.created_at())
                .then_with(|| b.id_typed().cmp(&a.id_typed()))
        });
        Ok(page.slice(owned.into_iter().cloned()))
    }

    async fn find_revision(
        &self,
        id: TenderId,
        version: u64,
    ) -> StoreResult<Option<TenderRevision>> {
        let state = self.read()?;
        Ok(state
            .revisions
            .get(&id)
            .and_then(|history| history.get(&version))
            .cloned())
    }

    async fn list_revisions(&self, id: TenderId) -> StoreResult<Vec<TenderRevision>> {
        let state = self.read()?;
        Ok(state
            .revisions
            .get(&id)
            .map(|history| history.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
        let id = tender.id_typed();
        let mut state = self.write()?;
        if state.tenders.contains_key(&id) {
            return Err(StoreError::Conflict(format!("tender {id} already exists")));
        }
        state
            .revisions
            .entry(id)
            .or_default()
            .insert(tender.version(), tender.revision(Utc::now()));
        state.tenders.insert(id, tender.clone());
        Ok(())
    }

    async fn update_tender(&self, tender: &Tender, expected: ExpectedVersion) -> StoreResult<()> {
        let id = tender.id_typed();
        let mut state = self.write()?;

        let current = state
            .tenders
            .get(&id)
            .map(|t| t.version())
            .ok_or_else(|| StoreError::NotFound(format!("tender {id}")))?;

        if !expected.matches(current) {
            return Err(StoreError::Conflict(format!(
                "tender {id}: expected {expected:?}, found version {current}"
            )));
        }

        let history = state.revisions.entry(id).or_default();
        if history.contains_key(&tender.version()) {
            return Err(StoreError::Conflict(format!(
                "tender {id}: version {} already recorded",
                tender.version()
            )));
        }
        history.insert(tender.version(), tender.revision(Utc::now()));
        state.tenders.insert(id, tender.clone());
        Ok(())
    }

    async fn insert_bid(&self, bid: &Bid) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.bids.iter().any(|b| b.id == bid.id) {
            return Err(StoreError::Conflict(format!("bid {} already exists", bid.id)));
        }
        state.bids.push(bid.clone());
        Ok(())
    }

    async fn list_bids_by_author(&self, author: BidAuthor, page: Page) -> StoreResult<Vec<Bid>> {
        let state = self.read()?;
        let mut authored: Vec<&Bid> = state.bids.iter().filter(|b| b.author == author).collect();
        authored.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| b.id.cmp(&a.id)));
        Ok(page.slice(authored.into_iter().cloned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tenderflow_tenders::{ServiceType, TenderDraft, TenderFields, TenderPatch};

    fn test_tender(organization_id: OrganizationId, name: &str) -> Tender {
        Tender::create(
            TenderId::new(),
            TenderDraft {
                organization_id,
                fields: TenderFields::new(name, "desc", ServiceType::Delivery).unwrap(),
            },
            EmployeeId::new(),
            Utc::now(),
        )
        .unwrap()
    }

    fn rename(tender: &Tender, name: &str) -> Tender {
        tender
            .edit(&TenderPatch {
                name: Some(name.to_string()),
                ..TenderPatch::default()
            })
            .unwrap()
    }

    #[tokio::test]
    async fn insert_records_first_revision() {
        let store = InMemoryTenderStore::new();
        let tender = test_tender(OrganizationId::new(), "a");
        store.insert_tender(&tender).await.unwrap();

        let revisions = store.list_revisions(tender.id_typed()).await.unwrap();
        assert_eq!(revisions.len(), 1);
        assert_eq!(revisions[0].version, 1);
    }

    #[tokio::test]
    async fn update_with_stale_version_is_a_conflict_and_writes_nothing() {
        let store = InMemoryTenderStore::new();
        let v1 = test_tender(OrganizationId::new(), "a");
        store.insert_tender(&v1).await.unwrap();

        let v2 = rename(&v1, "b");
        store.update_tender(&v2, v1.expected_version()).await.unwrap();

        // A second writer still holding v1.
        let stale = rename(&v1, "c");
        let err = store.update_tender(&stale, v1.expected_version()).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        let stored = store.find_tender(v1.id_typed()).await.unwrap().unwrap();
        assert_eq!(stored.fields().name, "b");
        assert_eq!(store.list_revisions(v1.id_typed()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_of_missing_tender_is_not_found() {
        let store = InMemoryTenderStore::new();
        let tender = test_tender(OrganizationId::new(), "a");
        let err = store
            .update_tender(&rename(&tender, "b"), ExpectedVersion::Any)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn listings_are_ordered_and_paged() {
        let store = InMemoryTenderStore::new();
        let org = OrganizationId::new();
        for name in ["charlie", "alpha", "bravo"] {
            store.insert_tender(&test_tender(org, name)).await.unwrap();
        }

        let filter = TenderFilter {
            service_types: vec![],
            page: Page::new(2, 0),
        };
        let names: Vec<String> = store
            .list_tenders(&filter)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.fields().name.clone())
            .collect();
        assert_eq!(names, vec!["alpha", "bravo"]);

        let filter = TenderFilter {
            service_types: vec![ServiceType::Construction],
            page: Page::new(10, 0),
        };
        assert!(store.list_tenders(&filter).await.unwrap().is_empty());
    }

    #[test]
    fn duplicate_usernames_are_rejected() {
        let store = InMemoryTenderStore::new();
        store.add_employee("alice", None).unwrap();
        assert!(matches!(
            store.add_employee("alice", None),
            Err(StoreError::Conflict(_))
        ));
    }
}
