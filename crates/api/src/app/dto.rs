use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenderflow_auth::AuthorizationExplanation;
use tenderflow_core::{AggregateRoot, DomainError, DomainResult, OrganizationId, TenderId};
use tenderflow_infra::AuthorizationDecision;
use tenderflow_tenders::{
    Bid, BidAuthor, BidDraft, ServiceType, Tender, TenderDraft, TenderFields, TenderPatch,
    TenderRevision,
};

// -------------------------
// Query parameters
// -------------------------

#[derive(Debug, Default, Deserialize)]
pub struct UsernameQuery {
    pub username: Option<String>,
}

impl UsernameQuery {
    /// Blank when absent; identity resolution rejects it with a validation error.
    pub fn username(&self) -> &str {
        self.username.as_deref().unwrap_or_default()
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ListTendersQuery {
    /// Comma-separated, e.g. `Construction,Delivery`.
    pub service_type: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UserPageQuery {
    pub username: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EditTenderQuery {
    pub username: Option<String>,
    pub expected_version: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateStatusQuery {
    pub status: Option<String>,
    pub username: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct PermissionQuery {
    pub username: Option<String>,
    pub action: Option<String>,
}

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenderRequest {
    pub name: String,
    pub description: String,
    pub service_type: String,
    pub organization_id: String,
    pub creator_username: String,
}

impl CreateTenderRequest {
    pub fn into_draft(self) -> DomainResult<(TenderDraft, String)> {
        let organization_id: OrganizationId = self.organization_id.parse()?;
        let fields = TenderFields::new(self.name, self.description, self.service_type.parse()?)?;
        Ok((
            TenderDraft {
                organization_id,
                fields,
            },
            self.creator_username,
        ))
    }
}

/// Partial edit; omitted fields keep their current value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EditTenderRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub service_type: Option<String>,
}

impl EditTenderRequest {
    pub fn into_patch(self) -> DomainResult<TenderPatch> {
        let service_type = self
            .service_type
            .as_deref()
            .map(str::parse::<ServiceType>)
            .transpose()?;
        Ok(TenderPatch {
            name: self.name,
            description: self.description,
            service_type,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBidRequest {
    pub name: String,
    pub description: String,
    pub tender_id: String,
    pub author_type: String,
    pub author_id: String,
}

impl CreateBidRequest {
    pub fn into_draft(self) -> DomainResult<BidDraft> {
        Ok(BidDraft {
            tender_id: self.tender_id.parse()?,
            author: BidAuthor::parse(&self.author_type, &self.author_id)?,
            name: self.name,
            description: self.description,
        })
    }
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TenderResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub organization_id: String,
    pub service_type: &'static str,
    pub status: &'static str,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Tender> for TenderResponse {
    fn from(tender: &Tender) -> Self {
        Self {
            id: tender.id_typed().to_string(),
            name: tender.fields().name.clone(),
            description: tender.fields().description.clone(),
            organization_id: tender.organization_id().to_string(),
            service_type: tender.fields().service_type.as_str(),
            status: tender.status().as_str(),
            version: tender.version(),
            created_at: tender.created_at(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevisionResponse {
    pub version: u64,
    pub name: String,
    pub description: String,
    pub service_type: &'static str,
    pub status: &'static str,
    pub recorded_at: DateTime<Utc>,
}

impl From<&TenderRevision> for RevisionResponse {
    fn from(revision: &TenderRevision) -> Self {
        Self {
            version: revision.version,
            name: revision.fields.name.clone(),
            description: revision.fields.description.clone(),
            service_type: revision.fields.service_type.as_str(),
            status: revision.status.as_str(),
            recorded_at: revision.recorded_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BidResponse {
    pub id: String,
    pub name: String,
    pub description: String,
    pub status: &'static str,
    pub tender_id: String,
    pub author_type: &'static str,
    pub author_id: String,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&Bid> for BidResponse {
    fn from(bid: &Bid) -> Self {
        Self {
            id: bid.id.to_string(),
            name: bid.name.clone(),
            description: bid.description.clone(),
            status: bid.status.as_str(),
            tender_id: bid.tender_id.to_string(),
            author_type: bid.author.author_type().as_str(),
            author_id: bid.author.author_uuid().to_string(),
            version: bid.version,
            created_at: bid.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionResponse {
    pub allowed: bool,
    pub reason: String,
    pub tender_version: u64,
    pub suggestions: Vec<String>,
}

impl From<AuthorizationDecision> for PermissionResponse {
    fn from(decision: AuthorizationDecision) -> Self {
        let AuthorizationExplanation {
            reason,
            denial_reason,
            ..
        } = decision.explanation;
        Self {
            allowed: decision.allowed,
            reason,
            tender_version: decision.tender_version,
            suggestions: denial_reason.map(|d| d.suggestions).unwrap_or_default(),
        }
    }
}

// -------------------------
// Parsing helpers
// -------------------------

pub fn parse_tender_id(raw: &str) -> DomainResult<TenderId> {
    raw.parse()
}

/// Split a comma-separated service type list; blank means "all".
pub fn parse_service_types(raw: Option<&str>) -> DomainResult<Vec<ServiceType>> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<ServiceType>)
        .collect()
}

pub fn require<'a>(value: &'a Option<String>, name: &str) -> DomainResult<&'a str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| DomainError::validation(format!("{name} is required")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_types_split_on_commas_case_insensitively() {
        assert_eq!(
            parse_service_types(Some("construction, Delivery")).unwrap(),
            vec![ServiceType::Construction, ServiceType::Delivery]
        );
        assert!(parse_service_types(None).unwrap().is_empty());
        assert!(parse_service_types(Some("Plumbing")).is_err());
    }

    #[test]
    fn create_request_uses_camel_case() {
        let body = serde_json::json!({
            "name": "Bridge",
            "description": "Build it",
            "serviceType": "construction",
            "organizationId": OrganizationId::new().to_string(),
            "creatorUsername": "alice",
        });
        let req: CreateTenderRequest = serde_json::from_value(body).unwrap();
        let (draft, creator) = req.into_draft().unwrap();
        assert_eq!(draft.fields.service_type, ServiceType::Construction);
        assert_eq!(creator, "alice");
    }

    #[test]
    fn edit_request_keeps_omitted_fields_empty() {
        let req: EditTenderRequest =
            serde_json::from_value(serde_json::json!({"description": "new"})).unwrap();
        let patch = req.into_patch().unwrap();
        assert_eq!(patch.description.as_deref(), Some("new"));
        assert!(patch.name.is_none() && patch.service_type.is_none());
    }

    #[test]
    fn tender_response_is_camel_case() {
        let tender = Tender::create(
            TenderId::new(),
            TenderDraft {
                organization_id: OrganizationId::new(),
                fields: TenderFields::new("Bridge", "Build it", ServiceType::Delivery).unwrap(),
            },
            tenderflow_core::EmployeeId::new(),
            Utc::now(),
        )
        .unwrap();
        let json = serde_json::to_value(TenderResponse::from(&tender)).unwrap();
        assert_eq!(json["serviceType"], "Delivery");
        assert_eq!(json["status"], "CREATED");
        assert_eq!(json["version"], 1);
        assert!(json.get("organizationId").is_some());
        assert!(json.get("createdAt").is_some());
    }
}
