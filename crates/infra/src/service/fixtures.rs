//! Seeded in-memory setup shared by the service tests.

use std::sync::Arc;

use tenderflow_auth::Employee;
use tenderflow_core::OrganizationId;
use tenderflow_tenders::{ServiceType, Tender, TenderDraft, TenderFields};

use crate::store::InMemoryTenderStore;

use super::TenderService;

pub(crate) struct Fixture {
    pub service: TenderService<Arc<InMemoryTenderStore>>,
    pub store: Arc<InMemoryTenderStore>,
    pub org: OrganizationId,
    /// Responsible for `org`.
    pub owner: Employee,
    /// Member of `org` without responsibility.
    pub outsider: Employee,
}

impl Fixture {
    pub fn new() -> Self {
        let store = Arc::new(InMemoryTenderStore::new());
        let org = store.add_organization("Acme").unwrap();
        let owner = store.add_employee("owner", Some(org)).unwrap();
        let outsider = store.add_employee("outsider", Some(org)).unwrap();
        store.add_responsible(owner.id, org).unwrap();

        Self {
            service: TenderService::new(Arc::clone(&store)),
            store,
            org,
            owner,
            outsider,
        }
    }

    pub fn draft(&self, name: &str) -> TenderDraft {
        TenderDraft {
            organization_id: self.org,
            fields: TenderFields::new(name, "Road repair", ServiceType::Construction).unwrap(),
        }
    }

    pub async fn created_tender(&self) -> Tender {
        self.service
            .create_tender(self.draft("Bridge"), "owner")
            .await
            .unwrap()
    }

    pub async fn published_tender(&self) -> Tender {
        let tender = self.created_tender().await;
        self.service
            .change_tender_status(tender.id_typed(), "Published", "owner")
            .await
            .unwrap()
    }
}
