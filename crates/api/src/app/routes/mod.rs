use axum::{Router, routing::get};

pub mod bids;
pub mod system;
pub mod tenders;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .route("/ping", get(system::ping))
        .nest("/tenders", tenders::router())
        .nest("/bids", bids::router())
}
