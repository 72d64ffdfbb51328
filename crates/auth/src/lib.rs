//! `tenderflow-auth` — tender authorization policy.
//!
//! Pure decisions over an already-resolved identity and tender state. Storage
//! lookups (who the user is, which organizations they answer for) happen in
//! the infrastructure layer before these functions are called.

pub mod action;
pub mod authorize;
pub mod employee;

pub use action::TenderAction;
pub use authorize::{
    AccessContext, AuthorizationExplanation, AuthzError, DenialKind, DenialReason, SubjectState,
    authorize, explain_authorization, is_allowed,
};
pub use employee::{Employee, Username};
