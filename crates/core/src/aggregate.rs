//! Versioned aggregate roots and optimistic concurrency expectations.

use crate::error::{DomainError, DomainResult};

/// Version assigned to every aggregate when it is first persisted.
pub const INITIAL_VERSION: u64 = 1;

/// Aggregate root marker + minimal interface.
///
/// Every successful mutation of an aggregate allocates exactly one new version,
/// so `version()` doubles as the optimistic concurrency token for writes.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    fn version(&self) -> u64;

    /// The version the next successful mutation will carry.
    fn next_version(&self) -> u64 {
        self.version() + 1
    }

    /// Expectation a writer should attach when persisting a mutation derived
    /// from this snapshot.
    fn expected_version(&self) -> ExpectedVersion {
        ExpectedVersion::Exact(self.version())
    }
}

/// Optimistic concurrency expectation for an aggregate write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ExpectedVersion {
    /// Skip version checking (seeding, migrations).
    Any,
    /// Require the stored aggregate to be at an exact version.
    Exact(u64),
}

impl ExpectedVersion {
    pub fn matches(self, actual: u64) -> bool {
        match self {
            ExpectedVersion::Any => true,
            ExpectedVersion::Exact(v) => v == actual,
        }
    }

    pub fn check(self, actual: u64) -> DomainResult<()> {
        if self.matches(actual) {
            Ok(())
        } else {
            Err(DomainError::conflict(format!(
                "optimistic concurrency check failed (expected: {self:?}, actual: {actual})"
            )))
        }
    }

    /// Caller-supplied version, if any, narrowed to an exact expectation.
    pub fn from_option(version: Option<u64>) -> Self {
        version.map_or(ExpectedVersion::Any, ExpectedVersion::Exact)
    }
}
