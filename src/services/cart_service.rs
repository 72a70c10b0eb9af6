use std::collections::HashMap;

use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use uuid::Uuid;

use crate::{
    audit,
    cart::total_quantity,
    dto::cart::{AddToCartRequest, CartCount, CartItemUpdated, CartView, UpdateCartRequest},
    entity::skus::{Column as SkuCol, Entity as Skus, Model as SkuModel},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartLineView, Sku},
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartView>> {
    let entries = state.cart.entries(user.user_id).await?;
    let ids: Vec<Uuid> = entries.iter().map(|e| e.sku_id).collect();

    let mut skus: HashMap<Uuid, Sku> = Skus::find()
        .filter(SkuCol::Id.is_in(ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| (m.id, Sku::from(m)))
        .collect();

    let mut items = Vec::with_capacity(entries.len());
    for entry in &entries {
        match skus.remove(&entry.sku_id) {
            Some(sku) => items.push(CartLineView::new(sku, entry.quantity)),
            // sku deleted from the catalog; checkout reports it as SKU_NOT_FOUND
            None => tracing::debug!(sku_id = %entry.sku_id, "cart entry without sku"),
        }
    }

    let total_count = items.iter().map(|l| i64::from(l.quantity)).sum();
    let total_price = items.iter().map(|l| l.amount).sum::<Decimal>();

    Ok(ApiResponse::success(
        "OK",
        CartView {
            items,
            total_count,
            total_price,
        },
        Some(Meta::empty()),
    ))
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItemUpdated>> {
    validate_quantity(payload.quantity)?;
    let sku = load_sku(state, payload.sku_id).await?;

    let current = state
        .cart
        .get_quantity(user.user_id, sku.id)
        .await?
        .unwrap_or(0);
    ensure_in_stock(&sku, accumulated(&sku, current, payload.quantity)?)?;

    let quantity = state
        .cart
        .add_quantity(user.user_id, sku.id, payload.quantity)
        .await?;

    audit::record(
        state,
        user.user_id,
        "cart_add",
        "cart",
        serde_json::json!({ "sku_id": sku.id, "quantity": quantity }),
    )
    .await;

    let cart = cart_count_for(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Added to cart",
        CartItemUpdated {
            sku_id: sku.id,
            quantity,
            cart,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_cart_item(
    state: &AppState,
    user: &AuthUser,
    sku_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<CartItemUpdated>> {
    validate_quantity(payload.quantity)?;
    let sku = load_sku(state, sku_id).await?;
    ensure_in_stock(&sku, payload.quantity)?;

    state
        .cart
        .set_quantity(user.user_id, sku.id, payload.quantity)
        .await?;

    audit::record(
        state,
        user.user_id,
        "cart_update",
        "cart",
        serde_json::json!({ "sku_id": sku.id, "quantity": payload.quantity }),
    )
    .await;

    let cart = cart_count_for(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Cart updated",
        CartItemUpdated {
            sku_id: sku.id,
            quantity: payload.quantity,
            cart,
        },
        Some(Meta::empty()),
    ))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    sku_id: Uuid,
) -> AppResult<ApiResponse<CartCount>> {
    if !state.cart.remove(user.user_id, sku_id).await? {
        return Err(AppError::NotFound);
    }

    audit::record(
        state,
        user.user_id,
        "cart_remove",
        "cart",
        serde_json::json!({ "sku_id": sku_id }),
    )
    .await;

    let cart = cart_count_for(state, user.user_id).await?;
    Ok(ApiResponse::success(
        "Removed from cart",
        cart,
        Some(Meta::empty()),
    ))
}

pub async fn cart_count(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartCount>> {
    let cart = cart_count_for(state, user.user_id).await?;
    Ok(ApiResponse::success("OK", cart, Some(Meta::empty())))
}

async fn cart_count_for(state: &AppState, user_id: Uuid) -> AppResult<CartCount> {
    let entries = state.cart.entries(user_id).await?;
    Ok(CartCount {
        entries: entries.len(),
        total_quantity: total_quantity(&entries),
    })
}

async fn load_sku(state: &AppState, sku_id: Uuid) -> AppResult<SkuModel> {
    Skus::find_by_id(sku_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::BadRequest(format!("sku {sku_id} not found")))
}

fn validate_quantity(quantity: i32) -> AppResult<()> {
    if quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn accumulated(sku: &SkuModel, current: i32, delta: i32) -> AppResult<i32> {
    current.checked_add(delta).ok_or_else(|| {
        AppError::Conflict(format!(
            "only {} left for sku {}",
            sku.stock, sku.id
        ))
    })
}

fn ensure_in_stock(sku: &SkuModel, quantity: i32) -> AppResult<()> {
    if quantity > sku.stock {
        return Err(AppError::Conflict(format!(
            "only {} left for sku {}",
            sku.stock, sku.id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn sku(stock: i32) -> SkuModel {
        SkuModel {
            id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            name: "Tea 250g".into(),
            price: dec!(4.50),
            stock,
            sales: 0,
            created_at: chrono::Utc::now().into(),
        }
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        assert!(matches!(validate_quantity(0), Err(AppError::BadRequest(_))));
        assert!(matches!(validate_quantity(-2), Err(AppError::BadRequest(_))));
        assert!(validate_quantity(1).is_ok());
    }

    #[test]
    fn quantity_above_stock_conflicts() {
        let sku = sku(3);
        assert!(ensure_in_stock(&sku, 3).is_ok());
        assert!(matches!(ensure_in_stock(&sku, 4), Err(AppError::Conflict(_))));
    }

    #[test]
    fn accumulating_past_i32_max_conflicts() {
        let sku = sku(10);
        assert_eq!(accumulated(&sku, 1, 2).unwrap(), 3);
        assert!(matches!(
            accumulated(&sku, 1, i32::MAX),
            Err(AppError::Conflict(_))
        ));
    }
}
