use core::str::FromStr;

use serde::{Deserialize, Serialize};

use tenderflow_tenders::TenderStatus;

use crate::AuthzError;

/// The four actions the tender policy knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenderAction {
    Create,
    Publish,
    Close,
    Edit,
}

impl TenderAction {
    pub const ALL: [TenderAction; 4] = [
        TenderAction::Create,
        TenderAction::Publish,
        TenderAction::Close,
        TenderAction::Edit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderAction::Create => "create",
            TenderAction::Publish => "publish",
            TenderAction::Close => "close",
            TenderAction::Edit => "edit",
        }
    }

    /// Action that guards moving a tender into `target`.
    ///
    /// Publishing and closing have their own rules; any other target falls back
    /// to the edit rule.
    pub fn for_transition(target: TenderStatus) -> Self {
        match target {
            TenderStatus::Published => TenderAction::Publish,
            TenderStatus::Closed => TenderAction::Close,
            TenderStatus::Created => TenderAction::Edit,
        }
    }
}

impl core::fmt::Display for TenderAction {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TenderAction {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TenderAction::ALL
            .into_iter()
            .find(|a| a.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| AuthzError::InvalidAction(wanted.to_string()))
    }
}
