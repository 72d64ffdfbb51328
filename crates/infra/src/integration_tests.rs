//! Integration tests for the tender service over the in-memory store.
//!
//! Tests: identity → authorization → domain transition → versioned write
//!
//! Verifies:
//! - Versions advance by exactly one per successful mutation
//! - Denied and failed operations leave the stored version untouched
//! - Concurrent writers from the same version produce exactly one winner

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use tokio::sync::Barrier;

    use tenderflow_auth::{Employee, Username};
    use tenderflow_core::{
        AggregateRoot, EmployeeId, ExpectedVersion, OrganizationId, TenderId,
    };
    use tenderflow_tenders::{
        Bid, BidAuthor, ServiceType, Tender, TenderDraft, TenderFields, TenderPatch,
        TenderRevision, TenderStatus,
    };

    use crate::service::{TenderService, TenderServiceError};
    use crate::store::{InMemoryTenderStore, Page, StoreResult, TenderFilter, TenderStore};

    struct World {
        store: Arc<InMemoryTenderStore>,
        service: TenderService<Arc<InMemoryTenderStore>>,
        org_a: OrganizationId,
    }

    fn setup() -> World {
        let store = Arc::new(InMemoryTenderStore::new());
        let org_a = store.add_organization("org-A").unwrap();
        let org_b = store.add_organization("org-B").unwrap();

        let alice = store.add_employee("alice", Some(org_a)).unwrap();
        store.add_responsible(alice.id, org_a).unwrap();
        let bob = store.add_employee("bob", Some(org_b)).unwrap();
        store.add_responsible(bob.id, org_b).unwrap();

        World {
            service: TenderService::new(Arc::clone(&store)),
            store,
            org_a,
        }
    }

    fn draft(organization_id: OrganizationId) -> TenderDraft {
        TenderDraft {
            organization_id,
            fields: TenderFields::new("Bridge", "Build a bridge", ServiceType::Construction)
                .unwrap(),
        }
    }

    fn rename(name: &str) -> TenderPatch {
        TenderPatch {
            name: Some(name.to_string()),
            ..TenderPatch::default()
        }
    }

    async fn stored_version(world: &World, id: TenderId) -> u64 {
        world.store.find_tender(id).await.unwrap().unwrap().version()
    }

    #[tokio::test]
    async fn publish_then_outsider_edit_walks_versions_one_to_three() {
        let world = setup();

        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();
        assert_eq!(tender.version(), 1);
        assert_eq!(tender.status(), TenderStatus::Created);

        let published = world
            .service
            .change_tender_status(tender.id_typed(), "Published", "alice")
            .await
            .unwrap();
        assert_eq!(published.status(), TenderStatus::Published);
        assert_eq!(published.version(), 2);

        // bob is responsible for org-B only; PUBLISHED opens editing to him.
        let edited = world
            .service
            .edit_tender(tender.id_typed(), "bob", rename("Bridge v2"), None)
            .await
            .unwrap();
        assert_eq!(edited.version(), 3);
        assert_eq!(edited.fields().name, "Bridge v2");
    }

    #[tokio::test]
    async fn outsider_edit_on_created_tender_is_forbidden_and_version_unchanged() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();

        let err = world
            .service
            .edit_tender(tender.id_typed(), "bob", rename("Hijacked"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::Forbidden(_)));
        assert_eq!(stored_version(&world, tender.id_typed()).await, 1);
    }

    #[tokio::test]
    async fn unknown_user_is_reported_for_every_action() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();

        for action in ["create", "publish", "close", "edit"] {
            let err = world
                .service
                .authorize(tender.id_typed(), "mallory", action)
                .await
                .unwrap_err();
            assert!(
                matches!(err, TenderServiceError::UserNotFound(_)),
                "{action}: {err:?}"
            );
        }
    }

    #[tokio::test]
    async fn published_tender_is_editable_by_anyone_known() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();
        assert!(
            !world
                .service
                .authorize(tender.id_typed(), "bob", "edit")
                .await
                .unwrap()
                .allowed
        );

        world
            .service
            .change_tender_status(tender.id_typed(), "published", "bob")
            .await
            .unwrap();
        assert!(
            world
                .service
                .authorize(tender.id_typed(), "bob", "edit")
                .await
                .unwrap()
                .allowed
        );
    }

    #[tokio::test]
    async fn create_is_forbidden_for_unknown_creator_or_organization() {
        let world = setup();

        let err = world
            .service
            .create_tender(draft(world.org_a), "mallory")
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::Forbidden(_)));

        let err = world
            .service
            .create_tender(draft(OrganizationId::new()), "alice")
            .await
            .unwrap_err();
        assert!(matches!(err, TenderServiceError::Forbidden(_)));
    }

    #[tokio::test]
    async fn rollback_restores_fields_under_a_new_version() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();
        let id = tender.id_typed();

        world
            .service
            .edit_tender(id, "alice", rename("Tunnel"), None)
            .await
            .unwrap();
        world
            .service
            .edit_tender(id, "alice", rename("Dam"), None)
            .await
            .unwrap();

        let restored = world.service.rollback_tender(id, 2, "alice").await.unwrap();
        assert_eq!(restored.version(), 4);
        assert_eq!(restored.fields().name, "Tunnel");

        let history = world.service.tender_history(id, "alice").await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[3].fields.name, "Tunnel");
    }

    // ── Concurrency ─────────────────────────────────────────────────────────

    /// Holds every `update_tender` call until two writers have arrived, so both
    /// have read the same version before either writes.
    struct GatedStore {
        inner: Arc<InMemoryTenderStore>,
        gate: Barrier,
    }

    #[async_trait]
    impl TenderStore for GatedStore {
        async fn find_employee_by_username(
            &self,
            username: &Username,
        ) -> StoreResult<Option<Employee>> {
            self.inner.find_employee_by_username(username).await
        }

        async fn employee_exists(&self, id: EmployeeId) -> StoreResult<bool> {
            self.inner.employee_exists(id).await
        }

        async fn organization_exists(&self, id: OrganizationId) -> StoreResult<bool> {
            self.inner.organization_exists(id).await
        }

        async fn is_organization_responsible(
            &self,
            employee_id: EmployeeId,
            organization_id: OrganizationId,
        ) -> StoreResult<bool> {
            self.inner
                .is_organization_responsible(employee_id, organization_id)
                .await
        }

        async fn find_tender(&self, id: TenderId) -> StoreResult<Option<Tender>> {
            self.inner.find_tender(id).await
        }

        async fn list_tenders(&self, filter: &TenderFilter) -> StoreResult<Vec<Tender>> {
            self.inner.list_tenders(filter).await
        }

        async fn list_organization_tenders(
            &self,
            organization_id: OrganizationId,
            page: Page,
        ) -> StoreResult<Vec<Tender>> {
            self.inner
                .list_organization_tenders(organization_id, page)
                .await
        }

        async fn find_revision(
            &self,
            id: TenderId,
            version: u64,
        ) -> StoreResult<Option<TenderRevision>> {
            self.inner.find_revision(id, version).await
        }

        async fn list_revisions(&self, id: TenderId) -> StoreResult<Vec<TenderRevision>> {
            self.inner.list_revisions(id).await
        }

        async fn insert_tender(&self, tender: &Tender) -> StoreResult<()> {
            self.inner.insert_tender(tender).await
        }

        async fn update_tender(
            &self,
            tender: &Tender,
            expected: ExpectedVersion,
        ) -> StoreResult<()> {
            self.gate.wait().await;
            self.inner.update_tender(tender, expected).await
        }

        async fn insert_bid(&self, bid: &Bid) -> StoreResult<()> {
            self.inner.insert_bid(bid).await
        }

        async fn list_bids_by_author(
            &self,
            author: BidAuthor,
            page: Page,
        ) -> StoreResult<Vec<Bid>> {
            self.inner.list_bids_by_author(author, page).await
        }
    }

    #[tokio::test]
    async fn concurrent_edits_from_same_version_yield_one_conflict() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();
        let id = tender.id_typed();

        let gated = TenderService::new(GatedStore {
            inner: Arc::clone(&world.store),
            gate: Barrier::new(2),
        });

        let (first, second) = tokio::join!(
            gated.edit_tender(id, "alice", rename("Tunnel"), None),
            gated.edit_tender(id, "alice", rename("Dam"), None),
        );

        let outcomes = [first, second];
        let winners = outcomes.iter().filter(|r| r.is_ok()).count();
        let conflicts = outcomes
            .iter()
            .filter(|r| matches!(r, Err(TenderServiceError::Conflict(_))))
            .count();
        assert_eq!((winners, conflicts), (1, 1), "{outcomes:?}");

        assert_eq!(stored_version(&world, id).await, 2);
        assert_eq!(world.store.list_revisions(id).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn status_change_racing_an_edit_invalidates_the_loser() {
        let world = setup();
        let tender = world
            .service
            .create_tender(draft(world.org_a), "alice")
            .await
            .unwrap();
        let id = tender.id_typed();

        let gated = TenderService::new(GatedStore {
            inner: Arc::clone(&world.store),
            gate: Barrier::new(2),
        });

        let (closed, edited) = tokio::join!(
            gated.change_tender_status(id, "closed", "alice"),
            gated.edit_tender(id, "alice", rename("Tunnel"), None),
        );
        assert!(closed.is_ok() != edited.is_ok());
        assert_eq!(stored_version(&world, id).await, 2);
    }
}
