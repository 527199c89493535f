use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Path, Query, State},
    http::StatusCode,
    routing::{get, patch, post},
    Json, Router,
};
use preora_offer::{NewOffer, OfferView, SyncReport};
use preora_shared::{HydratedOffer, OfferPatch};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// `?include=items` (comma-separated) asks for linked items
#[derive(Debug, Default, Deserialize)]
pub struct IncludeQuery {
    pub include: Option<String>,
}

impl IncludeQuery {
    pub fn items(&self) -> bool {
        self.include
            .as_deref()
            .map(|s| s.split(',').any(|part| part.trim() == "items"))
            .unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateOfferRequest {
    #[serde(flatten)]
    pub patch: OfferPatch,
    /// Replaces the offer's item list when present
    #[serde(default, alias = "itemIds")]
    pub item_ids: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct UpdateOfferResponse {
    #[serde(flatten)]
    pub offer: OfferView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<SyncReport>,
}

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/v1/offers", get(list_offers))
        .route("/v1/offers/{id}", get(get_offer))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/v1/admin/offers", post(create_offer))
        .route("/v1/admin/offers/{id}", patch(update_offer).delete(delete_offer))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /v1/offers
pub async fn list_offers(
    State(state): State<AppState>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> Result<Json<Vec<OfferView>>, AppError> {
    let Query(query) = query?;
    let offers = state.offers.list_offers(query.items()).await?;
    Ok(Json(offers))
}

/// GET /v1/offers/{id}
pub async fn get_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
) -> Result<Json<OfferView>, AppError> {
    let Query(query) = query?;
    let offer = state.offers.get_offer(&id, query.items()).await?;
    Ok(Json(offer))
}

/// POST /v1/admin/offers
pub async fn create_offer(
    State(state): State<AppState>,
    body: Result<Json<NewOffer>, JsonRejection>,
) -> Result<(StatusCode, Json<HydratedOffer>), AppError> {
    let Json(input) = body?;
    let created = state.offers.create_offer(input).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// PATCH /v1/admin/offers/{id}
pub async fn update_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
    query: Result<Query<IncludeQuery>, QueryRejection>,
    body: Result<Json<UpdateOfferRequest>, JsonRejection>,
) -> Result<Json<UpdateOfferResponse>, AppError> {
    let Query(query) = query?;
    let Json(req) = body?;

    let (offer, sync) = state
        .offers
        .update_offer(&id, &req.patch, req.item_ids.as_deref(), query.items())
        .await?;

    Ok(Json(UpdateOfferResponse { offer, sync }))
}

/// DELETE /v1/admin/offers/{id}
pub async fn delete_offer(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    state.offers.delete_offer(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
