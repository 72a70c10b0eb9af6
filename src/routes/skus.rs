use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::skus::SkuList,
    error::AppResult,
    models::Sku,
    response::ApiResponse,
    services::catalog_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_skus))
        .route("/{id}", get(get_sku))
}

#[utoipa::path(
    get,
    path = "/api/skus",
    responses(
        (status = 200, description = "All skus, best sellers first", body = ApiResponse<SkuList>)
    ),
    tag = "Catalog"
)]
pub async fn list_skus(State(state): State<AppState>) -> AppResult<Json<ApiResponse<SkuList>>> {
    let resp = catalog_service::list_skus(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/skus/{id}",
    params(("id" = Uuid, Path, description = "SKU ID")),
    responses(
        (status = 200, description = "Sku detail", body = ApiResponse<Sku>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Catalog"
)]
pub async fn get_sku(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Sku>>> {
    let resp = catalog_service::get_sku(&state, id).await?;
    Ok(Json(resp))
}
