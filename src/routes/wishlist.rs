use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{delete, get},
};
use uuid::Uuid;

use crate::{
    dto::wishlist::{AddWishlistRequest, WishlistList, WishlistQuery},
    error::AppResult,
    models::WishlistEntry,
    response::ApiResponse,
    services::wishlist_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_wishlist).post(add_to_wishlist))
        .route("/{id}", delete(remove_from_wishlist))
}

#[utoipa::path(
    post,
    path = "/api/wishlist",
    request_body = AddWishlistRequest,
    responses(
        (status = 200, description = "Interest recorded (idempotent per product and email)", body = ApiResponse<WishlistEntry>),
        (status = 400, description = "Unknown product or invalid email"),
    ),
    tag = "Wishlist"
)]
pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Json(payload): Json<AddWishlistRequest>,
) -> AppResult<Json<ApiResponse<WishlistEntry>>> {
    let resp = wishlist_service::add_entry(&state.pool, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/wishlist",
    params(
        ("email" = String, Query, description = "Customer email")
    ),
    responses(
        (status = 200, description = "Wishlist entries for a customer", body = ApiResponse<WishlistList>),
    ),
    tag = "Wishlist"
)]
pub async fn list_wishlist(
    State(state): State<AppState>,
    Query(query): Query<WishlistQuery>,
) -> AppResult<Json<ApiResponse<WishlistList>>> {
    let resp = wishlist_service::list_for_email(&state.pool, &query.email).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/wishlist/{id}",
    params(
        ("id" = Uuid, Path, description = "Wishlist entry ID")
    ),
    responses(
        (status = 200, description = "Entry removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not Found"),
    ),
    tag = "Wishlist"
)]
pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = wishlist_service::remove_entry(&state.pool, id).await?;
    Ok(Json(resp))
}
