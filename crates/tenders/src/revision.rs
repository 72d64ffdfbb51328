use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use tenderflow_core::TenderId;

use crate::{TenderFields, TenderStatus};

/// Append-only snapshot of a tender at one version.
///
/// One revision exists for every version a tender has ever had. Revisions are
/// written alongside the tender row and never updated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenderRevision {
    pub tender_id: TenderId,
    pub version: u64,
    pub fields: TenderFields,
    pub status: TenderStatus,
    pub recorded_at: DateTime<Utc>,
}
