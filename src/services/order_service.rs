use chrono::Utc;
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::debug;
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithLines, PaymentConfirmationRequest, ReviewRequest},
    entity::{
        order_headers::{
            ActiveModel as OrderHeaderActive, Column as HeaderCol, Entity as OrderHeaders,
            Model as OrderHeaderModel, OrderStatus,
        },
        order_lines::{ActiveModel as OrderLineActive, Column as LineCol, Entity as OrderLines},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{OrderHeader, OrderLine, OrderLineView},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(HeaderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status: OrderStatus = status.parse().map_err(AppError::BadRequest)?;
        condition = condition.add(HeaderCol::Status.eq(status));
    }

    let mut finder = OrderHeaders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(HeaderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(HeaderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(OrderHeader::from)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let header = find_owned(&state.orm, user.user_id, order_id, false)
        .await?
        .ok_or(AppError::NotFound)?;
    let data = with_lines(&state.orm, header).await?;
    Ok(ApiResponse::success("OK", data, Some(Meta::empty())))
}

/// Record the gateway's trade reference for an online-paid order.
pub async fn confirm_payment(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: PaymentConfirmationRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let trade_no = payload.trade_no.trim();
    if trade_no.is_empty() {
        return Err(AppError::BadRequest("trade_no must not be empty".into()));
    }

    let txn = state.orm.begin().await?;
    let header = find_owned(&txn, user.user_id, order_id, true)
        .await?
        .ok_or(AppError::NotFound)?;

    if !header.payment_method.is_online() {
        return Err(AppError::BadRequest(format!(
            "order {order_id} is paid on delivery"
        )));
    }
    if header.status != OrderStatus::Unpaid {
        return Err(AppError::Conflict(format!(
            "order {order_id} is already {}",
            header.status
        )));
    }

    let mut active: OrderHeaderActive = header.into();
    active.trade_no = Set(Some(trade_no.to_string()));
    active.status = Set(OrderStatus::AwaitingReview);
    active.updated_at = Set(Utc::now().into());
    let header = active.update(&txn).await?;

    let data = with_lines(&txn, header).await?;
    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "order_paid",
        "order_headers",
        serde_json::json!({ "order_id": order_id, "trade_no": trade_no }),
    )
    .await;

    Ok(ApiResponse::success(
        "Payment recorded",
        data,
        Some(Meta::empty()),
    ))
}

/// Attach review comments to the order's lines and complete the order.
///
/// Every submitted entry is visited, `1..=total_count`. Entries naming a SKU
/// that is not on the order are skipped.
pub async fn submit_review(
    state: &AppState,
    user: &AuthUser,
    order_id: &str,
    payload: ReviewRequest,
) -> AppResult<ApiResponse<OrderWithLines>> {
    let total_count = payload.total_count;
    if total_count == 0 {
        return Err(AppError::BadRequest("no review entries submitted".into()));
    }
    if total_count != payload.entries.len() {
        return Err(AppError::BadRequest(format!(
            "total_count {total_count} does not match {} entries",
            payload.entries.len()
        )));
    }

    let txn = state.orm.begin().await?;
    let header = find_owned(&txn, user.user_id, order_id, true)
        .await?
        .ok_or(AppError::NotFound)?;
    if header.status != OrderStatus::AwaitingReview {
        return Err(AppError::Conflict(format!(
            "order {order_id} is {}, not awaiting review",
            header.status
        )));
    }

    let mut reviewed = 0usize;
    for i in 1..=total_count {
        let entry = &payload.entries[i - 1];
        let line = OrderLines::find()
            .filter(
                Condition::all()
                    .add(LineCol::OrderId.eq(order_id))
                    .add(LineCol::SkuId.eq(entry.sku_id)),
            )
            .one(&txn)
            .await?;
        let Some(line) = line else {
            debug!(order_id, sku_id = %entry.sku_id, "review entry for sku not on order");
            continue;
        };

        let mut active: OrderLineActive = line.into();
        active.comment = Set(Some(entry.content.clone()));
        active.update(&txn).await?;
        reviewed += 1;
    }

    let mut active: OrderHeaderActive = header.into();
    active.status = Set(OrderStatus::Completed);
    active.updated_at = Set(Utc::now().into());
    let header = active.update(&txn).await?;

    let data = with_lines(&txn, header).await?;
    txn.commit().await?;

    audit::record(
        state,
        user.user_id,
        "order_review",
        "order_lines",
        serde_json::json!({ "order_id": order_id, "reviewed": reviewed }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review submitted",
        data,
        Some(Meta::empty()),
    ))
}

async fn find_owned<C: ConnectionTrait>(
    conn: &C,
    user_id: Uuid,
    order_id: &str,
    for_update: bool,
) -> Result<Option<OrderHeaderModel>, DbErr> {
    let mut finder = OrderHeaders::find().filter(
        Condition::all()
            .add(HeaderCol::UserId.eq(user_id))
            .add(HeaderCol::OrderId.eq(order_id)),
    );
    if for_update {
        finder = finder.lock(LockType::Update);
    }
    finder.one(conn).await
}

async fn with_lines<C: ConnectionTrait>(
    conn: &C,
    header: OrderHeaderModel,
) -> Result<OrderWithLines, DbErr> {
    let lines = OrderLines::find()
        .filter(LineCol::OrderId.eq(header.order_id.clone()))
        .order_by_asc(LineCol::SkuId)
        .all(conn)
        .await?
        .into_iter()
        .map(|m| OrderLineView::from(OrderLine::from(m)))
        .collect();

    let order = OrderHeader::from(header);
    let total_payable = order.total_payable();
    Ok(OrderWithLines {
        order,
        lines,
        total_payable,
    })
}
