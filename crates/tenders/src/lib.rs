//! Tender domain module (tenders, their revision history, and bids).
//!
//! Business rules only: field validation, the status lifecycle and version
//! allocation. Persistence and authorization live in other crates.

pub mod bid;
pub mod fields;
pub mod revision;
pub mod service_type;
pub mod status;
pub mod tender;

pub use bid::{Bid, BidAuthor, BidAuthorType, BidDraft, BidStatus};
pub use fields::{TenderFields, TenderPatch, DESCRIPTION_MAX_LEN, NAME_MAX_LEN};
pub use revision::TenderRevision;
pub use service_type::ServiceType;
pub use status::TenderStatus;
pub use tender::{Tender, TenderDraft};
