use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenderflow_core::{
    AggregateRoot, DomainError, DomainResult, EmployeeId, INITIAL_VERSION, OrganizationId, TenderId,
};

use crate::{TenderFields, TenderPatch, TenderRevision, TenderStatus};

/// Input for creating a tender on behalf of an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderDraft {
    pub organization_id: OrganizationId,
    pub fields: TenderFields,
}

/// Aggregate root: Tender.
///
/// Every mutation returns a new snapshot carrying `version + 1`; the receiver is
/// left untouched so callers can still write with the version they observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tender {
    id: TenderId,
    organization_id: OrganizationId,
    creator_id: EmployeeId,
    fields: TenderFields,
    status: TenderStatus,
    version: u64,
    created_at: DateTime<Utc>,
}

impl Tender {
    /// A freshly created tender: `CREATED` at the initial version.
    pub fn create(
        id: TenderId,
        draft: TenderDraft,
        creator_id: EmployeeId,
        created_at: DateTime<Utc>,
    ) -> DomainResult<Self> {
        draft.fields.validate()?;

        Ok(Self {
            id,
            organization_id: draft.organization_id,
            creator_id,
            fields: draft.fields,
            status: TenderStatus::Created,
            version: INITIAL_VERSION,
            created_at,
        })
    }

    /// Rebuild a tender from persisted state.
    pub fn restore(
        id: TenderId,
        organization_id: OrganizationId,
        creator_id: EmployeeId,
        fields: TenderFields,
        status: TenderStatus,
        version: u64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            organization_id,
            creator_id,
            fields,
            status,
            version,
            created_at,
        }
    }

    pub fn id_typed(&self) -> TenderId {
        self.id
    }

    pub fn organization_id(&self) -> OrganizationId {
        self.organization_id
    }

    pub fn creator_id(&self) -> EmployeeId {
        self.creator_id
    }

    pub fn fields(&self) -> &TenderFields {
        &self.fields
    }

    pub fn status(&self) -> TenderStatus {
        self.status
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply a partial field edit.
    pub fn edit(&self, patch: &TenderPatch) -> DomainResult<Self> {
        let fields = patch.apply_to(&self.fields)?;
        Ok(self.bumped(|t| t.fields = fields))
    }

    /// Move the tender along its lifecycle.
    pub fn change_status(&self, next: TenderStatus) -> DomainResult<Self> {
        if !self.status.can_transition_to(next) {
            return Err(DomainError::invariant(format!(
                "cannot change tender status from {} to {}",
                self.status, next
            )));
        }
        Ok(self.bumped(|t| t.status = next))
    }

    /// Restore the field values captured by `revision` under a new version.
    ///
    /// The status is not part of the rollback; only name, description and
    /// service type are reverted.
    pub fn rollback_to(&self, revision: &TenderRevision) -> DomainResult<Self> {
        if revision.tender_id != self.id {
            return Err(DomainError::invariant(format!(
                "revision belongs to tender {}, not {}",
                revision.tender_id, self.id
            )));
        }
        if revision.version > self.version {
            return Err(DomainError::invariant(format!(
                "revision {} is newer than current version {}",
                revision.version, self.version
            )));
        }
        let fields = revision.fields.clone();
        Ok(self.bumped(|t| t.fields = fields))
    }

    /// History record for the current version.
    pub fn revision(&self, recorded_at: DateTime<Utc>) -> TenderRevision {
        TenderRevision {
            tender_id: self.id,
            version: self.version,
            fields: self.fields.clone(),
            status: self.status,
            recorded_at,
        }
    }

    fn bumped(&self, mutate: impl FnOnce(&mut Self)) -> Self {
        let mut next = self.clone();
        mutate(&mut next);
        next.version = self.next_version();
        next
    }
}

impl AggregateRoot for Tender {
    type Id = TenderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}
