//! `tenderflow-core` — shared domain building blocks.
//!
//! Identifiers, the domain error model and the optimistic versioning
//! primitives used by every tender-side crate. No IO lives here.

pub mod aggregate;
pub mod error;
pub mod id;

pub use aggregate::{AggregateRoot, ExpectedVersion, INITIAL_VERSION};
pub use error::{DomainError, DomainResult};
pub use id::{BidId, EmployeeId, OrganizationId, TenderId};
