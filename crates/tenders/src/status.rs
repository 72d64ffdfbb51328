use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tenderflow_core::DomainError;

/// Tender status lifecycle: `CREATED -> PUBLISHED -> CLOSED`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TenderStatus {
    Created,
    Published,
    Closed,
}

impl TenderStatus {
    pub const ALL: [TenderStatus; 3] = [
        TenderStatus::Created,
        TenderStatus::Published,
        TenderStatus::Closed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderStatus::Created => "CREATED",
            TenderStatus::Published => "PUBLISHED",
            TenderStatus::Closed => "CLOSED",
        }
    }

    /// Forward-only transitions; a tender never returns to an earlier state.
    pub fn can_transition_to(self, next: TenderStatus) -> bool {
        matches!(
            (self, next),
            (TenderStatus::Created, TenderStatus::Published)
                | (TenderStatus::Created, TenderStatus::Closed)
                | (TenderStatus::Published, TenderStatus::Closed)
        )
    }
}

impl core::fmt::Display for TenderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive: `"Published"`, `"published"` and `"PUBLISHED"` are equivalent.
impl FromStr for TenderStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREATED" => Ok(TenderStatus::Created),
            "PUBLISHED" => Ok(TenderStatus::Published),
            "CLOSED" => Ok(TenderStatus::Closed),
            other => Err(DomainError::validation(format!(
                "unknown tender status '{other}' (expected one of: CREATED, PUBLISHED, CLOSED)"
            ))),
        }
    }
}
