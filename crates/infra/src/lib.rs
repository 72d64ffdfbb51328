//! Infrastructure layer: persistence, configuration, and the tender service
//! that composes the pure domain and policy crates with a store.

pub mod config;
pub mod service;
pub mod store;

#[cfg(test)]
mod integration_tests;

pub use config::{AppConfig, PostgresConfig, StoreBackend};
pub use service::{
    AuthorizationDecision, DEFAULT_TENDER_PAGE, DEFAULT_USER_PAGE, ErrorCategory, ServiceResult,
    TenderService, TenderServiceError,
};
pub use store::{
    DirectorySeed, InMemoryTenderStore, Page, PostgresTenderStore, StoreError, StoreResult, TenderFilter,
    TenderStore,
};
