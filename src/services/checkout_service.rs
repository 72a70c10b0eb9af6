use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, DbBackend, DbErr,
    EntityTrait, QueryFilter, QuerySelect, Set, Statement, TransactionTrait,
};
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::{
    audit,
    cart::CartStore,
    config::CheckoutSettings,
    dto::orders::{CommitOrderRequest, CommitOrderResult, PlaceOrderPreview, PlaceOrderRequest},
    entity::{
        order_headers::{ActiveModel as OrderHeaderActive, OrderStatus, PaymentMethod},
        order_lines::ActiveModel as OrderLineActive,
        skus::{ActiveModel as SkuActive, Column as SkuCol, Entity as Skus},
    },
    error::{AppError, AppResult, CheckoutError},
    middleware::auth::AuthUser,
    models::{CartLineView, Sku, line_amount},
    response::{ApiResponse, Meta},
    services::address_service,
    state::AppState,
};

/// A commit request that passed validation.
#[derive(Debug, Clone)]
pub struct CommitOrder {
    pub address_id: Uuid,
    pub payment_method: PaymentMethod,
    pub sku_ids: Vec<Uuid>,
}

impl CommitOrder {
    pub fn parse(payload: CommitOrderRequest) -> Result<Self, CheckoutError> {
        if payload.sku_ids.is_empty() {
            return Err(CheckoutError::Validation("sku_ids must not be empty".into()));
        }
        let payment_method = payload
            .payment_method
            .parse::<PaymentMethod>()
            .map_err(CheckoutError::Validation)?;
        Ok(Self {
            address_id: payload.address_id,
            payment_method,
            sku_ids: payload.sku_ids,
        })
    }
}

/// Timestamp prefix, a user fragment and a random suffix, so two commits by
/// the same user in the same second still get distinct ids.
pub fn generate_order_id(user_id: Uuid, now: DateTime<Utc>) -> String {
    let user = user_id.simple().to_string();
    let nonce = Uuid::new_v4().simple().to_string();
    format!("{}{}{}", now.format("%Y%m%d%H%M%S"), &user[..8], &nonce[..12])
}

/// Ascending, deduplicated SKU ids: the one order every checkout locks rows in.
pub fn canonical_lock_order(sku_ids: &[Uuid]) -> Vec<Uuid> {
    let mut ids = sku_ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<PlaceOrderPreview>> {
    if payload.sku_ids.is_empty() {
        return Err(AppError::BadRequest("sku_ids must not be empty".into()));
    }

    let mut selected: Vec<Uuid> = Vec::with_capacity(payload.sku_ids.len());
    for sku_id in payload.sku_ids {
        if !selected.contains(&sku_id) {
            selected.push(sku_id);
        }
    }

    let mut skus: HashMap<Uuid, Sku> = Skus::find()
        .filter(SkuCol::Id.is_in(selected.clone()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|m| (m.id, Sku::from(m)))
        .collect();

    let mut items = Vec::with_capacity(selected.len());
    let mut total_count: i32 = 0;
    let mut total_price = Decimal::ZERO;
    for sku_id in selected {
        let sku = skus.remove(&sku_id).ok_or(AppError::NotFound)?;
        let quantity = state
            .cart
            .get_quantity(user.user_id, sku_id)
            .await?
            .ok_or_else(|| AppError::BadRequest(format!("sku {sku_id} is not in the cart")))?;
        let line = CartLineView::new(sku, quantity);
        total_count += line.quantity;
        total_price += line.amount;
        items.push(line);
    }

    let addresses = address_service::list_for_user(&state.orm, user.user_id).await?;
    let shipping_fee = state.checkout.shipping_fee;

    Ok(ApiResponse::success(
        "OK",
        PlaceOrderPreview {
            items,
            total_count,
            total_price,
            shipping_fee,
            total_payable: total_price + shipping_fee,
            addresses,
        },
        Some(Meta::empty()),
    ))
}

pub async fn commit_order(
    state: &AppState,
    user: &AuthUser,
    payload: CommitOrderRequest,
) -> AppResult<ApiResponse<CommitOrderResult>> {
    let command = CommitOrder::parse(payload)?;
    let result = commit_order_in(
        &state.orm,
        state.cart.as_ref(),
        &state.checkout,
        user.user_id,
        command,
    )
    .await?;

    audit::record(
        state,
        user.user_id,
        "order_commit",
        "order_headers",
        serde_json::json!({
            "order_id": result.order_id,
            "total_count": result.total_count,
            "total_price": result.total_price,
        }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order created",
        result,
        Some(Meta::empty()),
    ))
}

/// Commit an order on `conn`.
///
/// Runs inside one nested transaction: a real transaction on a bare connection,
/// a savepoint when `conn` is already a transaction. SKU rows are locked with
/// `SELECT ... FOR UPDATE` in ascending id order and stock is checked only while
/// the lock is held. Any failure rolls the whole unit back, so no header, line or
/// stock change survives. Cart entries are cleared after the commit, best effort.
///
/// When `conn` is itself a transaction the order becomes durable only once the
/// caller commits it; a failure here never aborts the caller's transaction, and
/// the caller's `lock_timeout` is left as it was.
#[instrument(skip_all, fields(user_id = %user_id, skus = command.sku_ids.len()))]
pub async fn commit_order_in<C>(
    conn: &C,
    cart: &dyn CartStore,
    settings: &CheckoutSettings,
    user_id: Uuid,
    command: CommitOrder,
) -> Result<CommitOrderResult, CheckoutError>
where
    C: ConnectionTrait + TransactionTrait,
{
    if command.sku_ids.is_empty() {
        return Err(CheckoutError::Validation("sku_ids must not be empty".into()));
    }
    if address_service::find_owned(conn, user_id, command.address_id)
        .await?
        .is_none()
    {
        return Err(CheckoutError::AddressNotFound);
    }

    let order_id = generate_order_id(user_id, Utc::now());
    let lock_order = canonical_lock_order(&command.sku_ids);
    debug!(order_id = %order_id, lock_order = ?lock_order, "committing order");

    let savepoint = conn.begin().await?;
    let outcome = write_order(
        &savepoint,
        cart,
        settings,
        user_id,
        &order_id,
        &command,
        &lock_order,
    )
    .await;

    let placed = match outcome {
        Ok(placed) => placed,
        Err(err) => {
            if let Err(rollback_err) = savepoint.rollback().await {
                warn!(error = %rollback_err, order_id = %order_id, "savepoint rollback failed");
            }
            info!(code = err.code(), order_id = %order_id, error = %err, "order commit rolled back");
            return Err(err);
        }
    };
    savepoint.commit().await?;

    info!(
        order_id = %placed.order_id,
        total_count = placed.total_count,
        total_price = %placed.total_price,
        "order committed"
    );

    match cart.delete_many(user_id, &lock_order).await {
        Ok(removed) => debug!(removed, "cart entries cleared"),
        Err(err) => warn!(
            error = %err,
            order_id = %placed.order_id,
            "cart cleanup failed after order commit"
        ),
    }

    Ok(placed)
}

async fn write_order(
    txn: &DatabaseTransaction,
    cart: &dyn CartStore,
    settings: &CheckoutSettings,
    user_id: Uuid,
    order_id: &str,
    command: &CommitOrder,
    lock_order: &[Uuid],
) -> Result<CommitOrderResult, CheckoutError> {
    let previous_lock_wait = bound_lock_wait(txn, settings.lock_timeout).await?;

    let header = OrderHeaderActive {
        order_id: Set(order_id.to_string()),
        user_id: Set(user_id),
        address_id: Set(command.address_id),
        payment_method: Set(command.payment_method),
        total_count: Set(0),
        total_price: Set(Decimal::ZERO),
        shipping_fee: Set(settings.shipping_fee),
        status: Set(OrderStatus::Unpaid),
        trade_no: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(txn)
    .await?;

    let mut total_count: i32 = 0;
    let mut total_price = Decimal::ZERO;

    for &sku_id in lock_order {
        let sku = Skus::find_by_id(sku_id)
            .lock(LockType::Update)
            .one(txn)
            .await?
            .ok_or(CheckoutError::SkuNotFound(sku_id))?;

        let quantity = cart
            .get_quantity(user_id, sku_id)
            .await?
            .filter(|q| *q > 0)
            .ok_or_else(|| CheckoutError::Validation(format!("sku {sku_id} is not in the cart")))?;

        // stock read above is fresh: the row lock is held until commit/rollback
        if quantity > sku.stock {
            return Err(CheckoutError::InsufficientStock {
                sku_id,
                requested: quantity,
                available: sku.stock,
            });
        }

        OrderLineActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order_id.to_string()),
            sku_id: Set(sku_id),
            quantity: Set(quantity),
            price: Set(sku.price),
            comment: Set(None),
            created_at: NotSet,
        }
        .insert(txn)
        .await?;

        let (price, stock, sales) = (sku.price, sku.stock, sku.sales);
        let mut active: SkuActive = sku.into();
        active.stock = Set(stock - quantity);
        active.sales = Set(sales
            .checked_add(quantity)
            .ok_or_else(|| counter_overflow("sales", sku_id))?);
        active.update(txn).await?;

        total_count = total_count
            .checked_add(quantity)
            .ok_or_else(|| counter_overflow("order total_count", sku_id))?;
        total_price += line_amount(price, quantity);
    }

    // all rows are locked by now; hand the caller back its own wait bound
    restore_lock_wait(txn, previous_lock_wait).await?;

    let mut header: OrderHeaderActive = header.into();
    header.total_count = Set(total_count);
    header.total_price = Set(total_price);
    let header = header.update(txn).await?;

    Ok(CommitOrderResult {
        code: "SUCCESS".into(),
        order_id: header.order_id,
        total_count: header.total_count,
        total_price: header.total_price,
        shipping_fee: header.shipping_fee,
    })
}

fn counter_overflow(counter: &str, sku_id: Uuid) -> CheckoutError {
    CheckoutError::OrderCreationFailed(anyhow::anyhow!(
        "{counter} overflows at sku {sku_id}"
    ))
}

/// Make a blocked `FOR UPDATE` fail with lock_not_available instead of waiting forever.
///
/// A transaction-local setting made inside a savepoint outlives the savepoint's
/// release, so the previous value is returned for [`restore_lock_wait`].
async fn bound_lock_wait(
    txn: &DatabaseTransaction,
    timeout: Duration,
) -> Result<Option<String>, DbErr> {
    if txn.get_database_backend() != DbBackend::Postgres {
        return Ok(None);
    }
    let millis = timeout.as_millis().max(1);
    set_lock_wait(txn, format!("{millis}ms")).await
}

async fn restore_lock_wait(txn: &DatabaseTransaction, previous: Option<String>) -> Result<(), DbErr> {
    if let Some(previous) = previous {
        set_lock_wait(txn, previous).await?;
    }
    Ok(())
}

/// `set_config(.., is_local => true)` is `SET LOCAL`; returns the value it replaced.
async fn set_lock_wait(txn: &DatabaseTransaction, value: String) -> Result<Option<String>, DbErr> {
    let previous = txn
        .query_one(Statement::from_string(
            DbBackend::Postgres,
            "SELECT current_setting('lock_timeout') AS lock_timeout",
        ))
        .await?
        .map(|row| row.try_get::<String>("", "lock_timeout"))
        .transpose()?;
    txn.execute(Statement::from_sql_and_values(
        DbBackend::Postgres,
        "SELECT set_config('lock_timeout', $1, true)",
        [value.into()],
    ))
    .await?;
    Ok(previous)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(payment_method: &str, sku_ids: Vec<Uuid>) -> CommitOrderRequest {
        CommitOrderRequest {
            address_id: Uuid::new_v4(),
            payment_method: payment_method.into(),
            sku_ids,
        }
    }

    #[test]
    fn lock_order_is_ascending_and_unique() {
        let mut ids: Vec<Uuid> = (0..5).map(|_| Uuid::new_v4()).collect();
        ids.push(ids[2]);
        let ordered = canonical_lock_order(&ids);

        assert_eq!(ordered.len(), 5);
        assert!(ordered.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn lock_order_ignores_client_order() {
        let a = Uuid::from_u128(1);
        let b = Uuid::from_u128(2);
        assert_eq!(canonical_lock_order(&[b, a]), canonical_lock_order(&[a, b]));
        assert_eq!(canonical_lock_order(&[b, a]), vec![a, b]);
    }

    #[test]
    fn order_ids_start_with_timestamp_and_do_not_collide() {
        let user = Uuid::new_v4();
        let now = Utc::now();
        let first = generate_order_id(user, now);
        let second = generate_order_id(user, now);

        assert!(first.starts_with(&now.format("%Y%m%d%H%M%S").to_string()));
        assert!(first.contains(&user.simple().to_string()[..8]));
        assert!(first.len() <= 64);
        assert_ne!(first, second);
    }

    #[test]
    fn parse_rejects_empty_selection() {
        let err = CommitOrder::parse(request("alipay", vec![])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn parse_rejects_unknown_payment_method() {
        let err = CommitOrder::parse(request("gold_coins", vec![Uuid::new_v4()])).unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn parse_accepts_supported_payment_method() {
        let sku = Uuid::new_v4();
        let command = CommitOrder::parse(request("wechat_pay", vec![sku])).unwrap();
        assert_eq!(command.payment_method, PaymentMethod::WechatPay);
        assert_eq!(command.sku_ids, vec![sku]);
    }
}
