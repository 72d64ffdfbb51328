//! Tender persistence: the store contract plus in-memory and Postgres backends.

pub mod in_memory;
pub mod postgres;
pub mod seed;
pub mod r#trait;

pub use in_memory::InMemoryTenderStore;
pub use postgres::PostgresTenderStore;
pub use seed::{DirectorySeed, SeedOrganization};
pub use r#trait::{
    MAX_PAGE_LIMIT, Page, StoreError, StoreResult, TenderFilter, TenderStore,
};
