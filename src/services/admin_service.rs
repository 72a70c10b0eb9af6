use rust_decimal::Decimal;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    cache::{SKU_LIST_KEY, sku_key},
    dto::skus::{PriceUpdateRequest, RestockRequest, SkuList},
    entity::skus::{ActiveModel as SkuActive, Column as SkuCol, Entity as Skus},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Sku,
    response::{ApiResponse, Meta},
    routes::params::LowStockQuery,
    state::AppState,
};

pub async fn list_low_stock(
    state: &AppState,
    user: &AuthUser,
    query: LowStockQuery,
) -> AppResult<ApiResponse<SkuList>> {
    ensure_admin(user)?;
    let threshold = query.threshold.unwrap_or(5);
    let (page, limit, offset) = query.pagination.normalize();

    let finder = Skus::find()
        .filter(SkuCol::Stock.lte(threshold))
        .order_by_asc(SkuCol::Stock)
        .order_by_desc(SkuCol::Sales);

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(Sku::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Low stock", SkuList { items }, Some(meta)))
}

/// Adjust stock by `delta` under the same row lock checkout takes.
pub async fn restock(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: RestockRequest,
) -> AppResult<ApiResponse<Sku>> {
    ensure_admin(user)?;
    if payload.delta == 0 {
        return Err(AppError::BadRequest("delta must not be 0".into()));
    }

    let txn = state.orm.begin().await?;
    let sku = Skus::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    let new_stock = sku
        .stock
        .checked_add(payload.delta)
        .filter(|s| *s >= 0)
        .ok_or_else(|| AppError::BadRequest("stock cannot be negative".into()))?;

    let mut active: SkuActive = sku.into();
    active.stock = Set(new_stock);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    invalidate_sku(state, updated.id).await;

    audit::record(
        state,
        user.user_id,
        "inventory_adjust",
        "skus",
        serde_json::json!({ "sku_id": updated.id, "delta": payload.delta, "stock": updated.stock }),
    )
    .await;

    Ok(ApiResponse::success(
        "Inventory updated",
        Sku::from(updated),
        Some(Meta::empty()),
    ))
}

/// Change the current price. Existing order lines keep the price they were bought at.
pub async fn set_price(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: PriceUpdateRequest,
) -> AppResult<ApiResponse<Sku>> {
    ensure_admin(user)?;
    if payload.price < Decimal::ZERO {
        return Err(AppError::BadRequest("price cannot be negative".into()));
    }
    let price = payload.price.round_dp(2);

    let txn = state.orm.begin().await?;
    let sku = Skus::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let previous = sku.price;

    let mut active: SkuActive = sku.into();
    active.price = Set(price);
    let updated = active.update(&txn).await?;

    txn.commit().await?;
    invalidate_sku(state, updated.id).await;

    audit::record(
        state,
        user.user_id,
        "price_change",
        "skus",
        serde_json::json!({ "sku_id": updated.id, "from": previous, "to": updated.price }),
    )
    .await;

    Ok(ApiResponse::success(
        "Price updated",
        Sku::from(updated),
        Some(Meta::empty()),
    ))
}

async fn invalidate_sku(state: &AppState, sku_id: Uuid) {
    state.catalog.invalidate(&sku_key(sku_id)).await;
    state.catalog.invalidate(SKU_LIST_KEY).await;
}
