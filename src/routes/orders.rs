use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};

use crate::{
    dto::orders::{
        CommitOrderRequest, CommitOrderResult, OrderList, OrderWithLines,
        PaymentConfirmationRequest, PlaceOrderPreview, PlaceOrderRequest, ReviewRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{checkout_service, order_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_orders))
        .route("/place", post(place_order))
        .route("/commit", post(commit_order))
        .route("/{order_id}", get(get_order))
        .route("/{order_id}/payment", post(confirm_payment))
        .route("/{order_id}/review", post(submit_review))
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "Order history, newest first", body = ApiResponse<OrderList>),
        (status = 400, description = "Unknown status"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/place",
    request_body = PlaceOrderRequest,
    responses(
        (status = 200, description = "Checkout preview for the selected skus", body = ApiResponse<PlaceOrderPreview>),
        (status = 400, description = "Selection empty or not in cart"),
        (status = 404, description = "Unknown sku"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn place_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<PlaceOrderRequest>,
) -> AppResult<Json<ApiResponse<PlaceOrderPreview>>> {
    let resp = checkout_service::place_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/commit",
    request_body = CommitOrderRequest,
    responses(
        (status = 200, description = "Order committed (code SUCCESS)", body = ApiResponse<CommitOrderResult>),
        (status = 400, description = "VALIDATION_ERROR"),
        (status = 404, description = "NOT_FOUND or SKU_NOT_FOUND"),
        (status = 409, description = "INSUFFICIENT_STOCK"),
        (status = 500, description = "ORDER_CREATION_FAILED"),
        (status = 503, description = "CONTENTION_TIMEOUT, safe to retry"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn commit_order(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CommitOrderRequest>,
) -> AppResult<Json<ApiResponse<CommitOrderResult>>> {
    let resp = checkout_service::commit_order(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    params(("order_id" = String, Path, description = "Order ID")),
    responses(
        (status = 200, description = "Order with its lines", body = ApiResponse<OrderWithLines>),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::get_order(&state, &user, &order_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/payment",
    params(("order_id" = String, Path, description = "Order ID")),
    request_body = PaymentConfirmationRequest,
    responses(
        (status = 200, description = "Payment recorded", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "Empty trade_no or cash on delivery order"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not unpaid"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn confirm_payment(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    Json(payload): Json<PaymentConfirmationRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::confirm_payment(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/review",
    params(("order_id" = String, Path, description = "Order ID")),
    request_body = ReviewRequest,
    responses(
        (status = 200, description = "Review stored, order completed", body = ApiResponse<OrderWithLines>),
        (status = 400, description = "total_count does not match entries"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not awaiting review"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn submit_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(order_id): Path<String>,
    Json(payload): Json<ReviewRequest>,
) -> AppResult<Json<ApiResponse<OrderWithLines>>> {
    let resp = order_service::submit_review(&state, &user, &order_id, payload).await?;
    Ok(Json(resp))
}
