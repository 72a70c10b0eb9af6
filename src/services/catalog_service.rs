use sea_orm::{EntityTrait, QueryOrder};
use uuid::Uuid;

use crate::{
    cache::{SKU_LIST_KEY, sku_key},
    dto::skus::SkuList,
    entity::skus::{Column as SkuCol, Entity as Skus},
    error::{AppError, AppResult},
    models::Sku,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Every SKU, best sellers first. Served from the catalog cache when warm.
pub async fn list_skus(state: &AppState) -> AppResult<ApiResponse<SkuList>> {
    if let Some(list) = state.catalog.get::<SkuList>(SKU_LIST_KEY).await {
        return Ok(ApiResponse::success("OK", list, Some(Meta::empty())));
    }

    let items = Skus::find()
        .order_by_desc(SkuCol::Sales)
        .order_by_asc(SkuCol::Name)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Sku::from)
        .collect();
    let list = SkuList { items };
    state.catalog.set(SKU_LIST_KEY, &list).await;

    Ok(ApiResponse::success("OK", list, Some(Meta::empty())))
}

pub async fn get_sku(state: &AppState, id: Uuid) -> AppResult<ApiResponse<Sku>> {
    let key = sku_key(id);
    if let Some(sku) = state.catalog.get::<Sku>(&key).await {
        return Ok(ApiResponse::success("OK", sku, Some(Meta::empty())));
    }

    let sku = Skus::find_by_id(id)
        .one(&state.orm)
        .await?
        .map(Sku::from)
        .ok_or(AppError::NotFound)?;
    state.catalog.set(&key, &sku).await;

    Ok(ApiResponse::success("OK", sku, Some(Meta::empty())))
}
