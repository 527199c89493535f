use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::{get, put},
    Json, Router,
};
use preora_catalog::ItemInput;
use preora_shared::Item;

use crate::error::AppError;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/v1/items/{id}", get(get_item))
}

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/v1/admin/items/{id}", put(put_item))
}

/// GET /v1/items/{id}
pub async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Item>, AppError> {
    let item = state.catalog.get_item(&id).await?;
    Ok(Json(item))
}

/// PUT /v1/admin/items/{id}
pub async fn put_item(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<ItemInput>, JsonRejection>,
) -> Result<Json<Item>, AppError> {
    let Json(input) = body?;
    let item = state.catalog.save_item(&id, input).await?;
    Ok(Json(item))
}
