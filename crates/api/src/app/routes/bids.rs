use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};

use tenderflow_infra::{DEFAULT_USER_PAGE, Page};

use crate::app::services::AppServices;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/new", post(create_bid))
        .route("/my", get(my_bids))
}

pub async fn create_bid(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateBidRequest>,
) -> axum::response::Response {
    let draft = match body.into_draft() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tenders().create_bid(draft).await {
        Ok(bid) => (StatusCode::OK, Json(dto::BidResponse::from(&bid))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn my_bids(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(q): ApiQuery<dto::UserPageQuery>,
) -> axum::response::Response {
    let page = match Page::parse(q.limit, q.offset, DEFAULT_USER_PAGE) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let username = q.username.as_deref().unwrap_or_default();

    match services.tenders().user_bids(username, page).await {
        Ok(bids) => {
            let body: Vec<dto::BidResponse> = bids.iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
