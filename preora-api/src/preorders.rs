use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, patch},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use preora_order::{LineRequest, PreorderRequest};
use preora_shared::{Preorder, PreorderStatusUpdate};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::middleware::Claims;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreatePreorderRequest {
    #[serde(default, alias = "offerId")]
    pub offer_id: Option<String>,
    pub items: Vec<LineRequest>,
    #[serde(default, alias = "expectedRelease")]
    pub expected_release: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatePreorderResponse {
    pub preorder_id: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub mine: bool,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/preorders", get(list_preorders).post(create_preorder))
        .route("/v1/preorders/{id}", get(get_preorder))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/v1/admin/preorders/{id}/status", patch(update_status))
}

/// POST /v1/preorders
/// The token subject becomes the owning customer
pub async fn create_preorder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<CreatePreorderRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatePreorderResponse>), AppError> {
    let Json(req) = body?;

    let request = PreorderRequest {
        offer_id: req.offer_id,
        customer_id: claims.sub,
        items: req.items,
        expected_release: req.expected_release,
    };
    let preorder = state.preorders.build_and_store(&request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatePreorderResponse {
            preorder_id: preorder.id,
        }),
    ))
}

/// GET /v1/preorders
pub async fn list_preorders(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    query: Result<Query<ListQuery>, QueryRejection>,
) -> Result<Json<Vec<Preorder>>, AppError> {
    let Query(query) = query?;

    let owner = if query.mine {
        Some(claims.sub.as_str())
    } else if claims.is_admin() {
        None
    } else {
        return Err(AppError::AuthorizationError(
            "listing all preorders requires admin access".to_string(),
        ));
    };

    Ok(Json(state.preorders.list(owner).await?))
}

/// GET /v1/preorders/{id}
pub async fn get_preorder(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Result<Json<Preorder>, AppError> {
    let preorder = state.preorders.get(&id).await?;

    if preorder.customer_id != claims.sub && !claims.is_admin() {
        return Err(AppError::AuthorizationError(
            "preorder belongs to another customer".to_string(),
        ));
    }

    Ok(Json(preorder))
}

/// PATCH /v1/admin/preorders/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<PreorderStatusUpdate>, JsonRejection>,
) -> Result<Json<Preorder>, AppError> {
    let Json(update) = body?;
    let preorder = state.preorders.transition(&id, &update).await?;
    Ok(Json(preorder))
}
