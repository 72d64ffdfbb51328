use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tenderflow_core::{
    AggregateRoot, BidId, DomainError, DomainResult, EmployeeId, INITIAL_VERSION, OrganizationId,
    TenderId,
};

use crate::fields::validate_text;
use crate::{DESCRIPTION_MAX_LEN, NAME_MAX_LEN};

/// Bid status. Bids are created in `CREATED`; the remaining workflow is not
/// driven by this service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BidStatus {
    Created,
    Published,
    Canceled,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Created => "CREATED",
            BidStatus::Published => "PUBLISHED",
            BidStatus::Canceled => "CANCELED",
        }
    }
}

impl FromStr for BidStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(BidStatus::Created),
            "PUBLISHED" => Ok(BidStatus::Published),
            "CANCELED" => Ok(BidStatus::Canceled),
            other => Err(DomainError::validation(format!("unknown bid status '{other}'"))),
        }
    }
}

/// Who a bid is placed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BidAuthorType {
    User,
    Organization,
}

impl BidAuthorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidAuthorType::User => "User",
            BidAuthorType::Organization => "Organization",
        }
    }
}

impl FromStr for BidAuthorType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "USER" => Ok(BidAuthorType::User),
            "ORGANIZATION" => Ok(BidAuthorType::Organization),
            other => Err(DomainError::validation(format!(
                "invalid author type '{other}' (expected User or Organization)"
            ))),
        }
    }
}

/// Typed bid author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "authorType", content = "authorId")]
pub enum BidAuthor {
    User(EmployeeId),
    Organization(OrganizationId),
}

impl BidAuthor {
    /// Pair a raw author id with its declared type.
    pub fn parse(author_type: &str, author_id: &str) -> DomainResult<Self> {
        match author_type.parse::<BidAuthorType>()? {
            BidAuthorType::User => Ok(BidAuthor::User(author_id.parse()?)),
            BidAuthorType::Organization => Ok(BidAuthor::Organization(author_id.parse()?)),
        }
    }

    pub fn author_type(&self) -> BidAuthorType {
        match self {
            BidAuthor::User(_) => BidAuthorType::User,
            BidAuthor::Organization(_) => BidAuthorType::Organization,
        }
    }

    pub fn author_uuid(&self) -> Uuid {
        match self {
            BidAuthor::User(id) => *id.as_uuid(),
            BidAuthor::Organization(id) => *id.as_uuid(),
        }
    }
}

/// Input for placing a bid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BidDraft {
    pub name: String,
    pub description: String,
    pub tender_id: TenderId,
    pub author: BidAuthor,
}

/// A proposal submitted against a tender.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bid {
    pub id: BidId,
    pub name: String,
    pub description: String,
    pub tender_id: TenderId,
    pub author: BidAuthor,
    pub status: BidStatus,
    pub version: u64,
    pub created_at: DateTime<Utc>,
}

impl Bid {
    pub fn create(id: BidId, draft: BidDraft, created_at: DateTime<Utc>) -> DomainResult<Self> {
        validate_text("name", &draft.name, NAME_MAX_LEN)?;
        validate_text("description", &draft.description, DESCRIPTION_MAX_LEN)?;

        Ok(Self {
            id,
            name: draft.name,
            description: draft.description,
            tender_id: draft.tender_id,
            author: draft.author,
            status: BidStatus::Created,
            version: INITIAL_VERSION,
            created_at,
        })
    }
}

impl AggregateRoot for Bid {
    type Id = BidId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(author: BidAuthor) -> BidDraft {
        BidDraft {
            name: "Offer".to_string(),
            description: "We can do it in 30 days".to_string(),
            tender_id: TenderId::new(),
            author,
        }
    }

    #[test]
    fn new_bid_is_created_at_version_one() {
        let bid = Bid::create(BidId::new(), draft(BidAuthor::User(EmployeeId::new())), Utc::now())
            .unwrap();
        assert_eq!(bid.status, BidStatus::Created);
        assert_eq!(bid.version(), 1);
    }

    #[test]
    fn author_type_is_case_insensitive() {
        let id = EmployeeId::new().to_string();
        let author = BidAuthor::parse("user", &id).unwrap();
        assert_eq!(author.author_type(), BidAuthorType::User);

        let org = OrganizationId::new().to_string();
        let author = BidAuthor::parse("ORGANIZATION", &org).unwrap();
        assert_eq!(author.author_type(), BidAuthorType::Organization);
    }

    #[test]
    fn unknown_author_type_is_a_validation_error() {
        let err = BidAuthor::parse("Robot", &EmployeeId::new().to_string()).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn blank_bid_name_is_rejected() {
        let mut d = draft(BidAuthor::User(EmployeeId::new()));
        d.name = " ".to_string();
        assert!(Bid::create(BidId::new(), d, Utc::now()).is_err());
    }
}
