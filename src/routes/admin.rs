use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::{
        orders::{OrderList, RejectOrderRequest},
        wishlist::WishlistList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, WishlistEntry},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::{order_service, wishlist_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/orders", get(list_all_orders))
        .route("/orders/{id}", get(get_order_admin))
        .route("/orders/{id}/approve", post(approve_order))
        .route("/orders/{id}/reject", post(reject_order))
        .route("/orders/{id}/ship", post(ship_order))
        .route("/orders/{id}/complete", post(complete_order))
        .route("/wishlist/{id}", get(pending_wishlist))
        .route("/wishlist/{id}/notified", post(mark_wishlist_notified))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc (default desc)")
    ),
    responses(
        (status = 200, description = "All orders, newest first", body = ApiResponse<OrderList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn list_all_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::list_orders(&state.pool, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with item snapshot", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn get_order_admin(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order_admin(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/approve",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Payment slip approved", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not pending or has no slip"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn approve_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::approve_order(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/reject",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = RejectOrderRequest,
    responses(
        (status = 200, description = "Payment slip rejected", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not pending"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn reject_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<RejectOrderRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::reject_order(&state.pool, &user, id, payload.reason).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/ship",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order marked shipped", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not confirmed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn ship_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::ship_order(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/orders/{id}/complete",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order completed", body = ApiResponse<Order>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Order is not shipped"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn complete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::complete_order(&state.pool, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/admin/wishlist/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Un-notified wishlist entries for a product", body = ApiResponse<WishlistList>),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn pending_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::pending_for_product(&state.pool, &user, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/admin/wishlist/{id}/notified",
    params(
        ("id" = Uuid, Path, description = "Wishlist entry ID")
    ),
    responses(
        (status = 200, description = "Entry marked notified", body = ApiResponse<WishlistEntry>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Not Found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Admin"
)]
pub async fn mark_wishlist_notified(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<WishlistEntry>>> {
    let resp = wishlist_service::mark_notified(&state.pool, &user, id).await?;
    Ok(Json(resp))
}
