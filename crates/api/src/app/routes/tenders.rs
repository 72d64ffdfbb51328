use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post, put},
};

use tenderflow_infra::{DEFAULT_TENDER_PAGE, DEFAULT_USER_PAGE, Page};

use crate::app::services::AppServices;
use crate::app::extract::{ApiJson, ApiQuery};
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_tenders))
        .route("/new", post(create_tender))
        .route("/my", get(my_tenders))
        .route("/:id/edit", patch(edit_tender))
        .route("/:id/status", get(tender_status).put(update_status))
        .route("/:id/rollback/:version", put(rollback_tender))
        .route("/:id/versions", get(tender_versions))
        .route("/:id/permissions", get(tender_permissions))
}

pub async fn list_tenders(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(q): ApiQuery<dto::ListTendersQuery>,
) -> axum::response::Response {
    let service_types = match dto::parse_service_types(q.service_type.as_deref()) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let page = match Page::parse(q.limit, q.offset, DEFAULT_TENDER_PAGE) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tenders().list_tenders(service_types, page).await {
        Ok(tenders) => {
            let body: Vec<dto::TenderResponse> = tenders.iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn my_tenders(
    Extension(services): Extension<Arc<AppServices>>,
    ApiQuery(q): ApiQuery<dto::UserPageQuery>,
) -> axum::response::Response {
    let page = match Page::parse(q.limit, q.offset, DEFAULT_USER_PAGE) {
        Ok(p) => p,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let username = q.username.as_deref().unwrap_or_default();

    match services.tenders().user_tenders(username, page).await {
        Ok(tenders) => {
            let body: Vec<dto::TenderResponse> = tenders.iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_tender(
    Extension(services): Extension<Arc<AppServices>>,
    ApiJson(body): ApiJson<dto::CreateTenderRequest>,
) -> axum::response::Response {
    let (draft, creator) = match body.into_draft() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tenders().create_tender(draft, &creator).await {
        Ok(tender) => (StatusCode::OK, Json(dto::TenderResponse::from(&tender))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn edit_tender(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiQuery(q): ApiQuery<dto::EditTenderQuery>,
    ApiJson(body): ApiJson<dto::EditTenderRequest>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let patch = match body.into_patch() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let username = q.username.as_deref().unwrap_or_default();

    match services
        .tenders()
        .edit_tender(tender_id, username, patch, q.expected_version)
        .await
    {
        Ok(tender) => (StatusCode::OK, Json(dto::TenderResponse::from(&tender))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn tender_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiQuery(q): ApiQuery<dto::UsernameQuery>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tenders().tender_status(tender_id, q.username()).await {
        Ok(status) => (StatusCode::OK, Json(status.as_str())).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiQuery(q): ApiQuery<dto::UpdateStatusQuery>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let status = match dto::require(&q.status, "status") {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let username = q.username.as_deref().unwrap_or_default();

    match services
        .tenders()
        .change_tender_status(tender_id, status, username)
        .await
    {
        Ok(tender) => (StatusCode::OK, Json(dto::TenderResponse::from(&tender))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn rollback_tender(
    Extension(services): Extension<Arc<AppServices>>,
    Path((id, version)): Path<(String, String)>,
    ApiQuery(q): ApiQuery<dto::UsernameQuery>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let Ok(target_version) = version.trim().parse::<i64>() else {
        return errors::json_error(
            StatusCode::BAD_REQUEST,
            "validation_failed",
            format!("version must be an integer, got '{version}'"),
        );
    };

    match services
        .tenders()
        .rollback_tender(tender_id, target_version, q.username())
        .await
    {
        Ok(tender) => (StatusCode::OK, Json(dto::TenderResponse::from(&tender))).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn tender_versions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiQuery(q): ApiQuery<dto::UsernameQuery>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };

    match services.tenders().tender_history(tender_id, q.username()).await {
        Ok(revisions) => {
            let body: Vec<dto::RevisionResponse> = revisions.iter().map(Into::into).collect();
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn tender_permissions(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    ApiQuery(q): ApiQuery<dto::PermissionQuery>,
) -> axum::response::Response {
    let tender_id = match dto::parse_tender_id(&id) {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let action = match dto::require(&q.action, "action") {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let username = q.username.as_deref().unwrap_or_default();

    match services.tenders().authorize(tender_id, username, action).await {
        Ok(decision) => {
            (StatusCode::OK, Json(dto::PermissionResponse::from(decision))).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}
