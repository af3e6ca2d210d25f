use axum::{
    Json, Router,
    extract::{FromRequestParts, Path, State},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddToCartRequest, CartView, UpdateQuantityRequest},
    error::{AppError, AppResult},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub const SESSION_HEADER: &str = "x-cart-session";

/// Client-chosen cart session key, carried on every cart request. The key is
/// the storefront's "fixed localStorage key" equivalent: one snapshot row per
/// session, overwritten wholesale.
#[derive(Debug, Clone, Copy)]
pub struct CartSession(pub Uuid);

impl<S> FromRequestParts<S> for CartSession
where
    S: Send + Sync,
{
    type Rejection = AppError;
    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        let raw = parts
            .headers
            .get(SESSION_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::BadRequest("Missing X-Cart-Session header".into()))?;
        let key = Uuid::parse_str(raw)
            .map_err(|_| AppError::BadRequest("X-Cart-Session must be a UUID".into()))?;
        Ok(CartSession(key))
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(cart_view).delete(clear_cart))
        .route("/items", post(add_to_cart))
        .route(
            "/items/{product_id}",
            patch(update_quantity).delete(remove_from_cart),
        )
}

#[utoipa::path(
    get,
    path = "/api/cart",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Current cart with totals", body = ApiResponse<CartView>)
    ),
    tag = "Cart"
)]
pub async fn cart_view(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::view_cart(&state.pool, session.0).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/cart/items",
    request_body = AddToCartRequest,
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "One unit added (no-op when out of stock)", body = ApiResponse<CartView>),
        (status = 400, description = "Unknown product"),
    ),
    tag = "Cart"
)]
pub async fn add_to_cart(
    State(state): State<AppState>,
    session: CartSession,
    Json(payload): Json<AddToCartRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::add_item(&state.pool, session.0, payload.product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/cart/items/{product_id}",
    request_body = UpdateQuantityRequest,
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Quantity replaced; unparseable values are a no-op", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn update_quantity(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp =
        cart_service::update_quantity(&state.pool, session.0, product_id, &payload.quantity)
            .await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart/items/{product_id}",
    params(
        ("product_id" = Uuid, Path, description = "Product ID"),
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Line removed (no-op if absent)", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn remove_from_cart(
    State(state): State<AppState>,
    session: CartSession,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::remove_item(&state.pool, session.0, product_id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/cart",
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Cart emptied", body = ApiResponse<CartView>),
    ),
    tag = "Cart"
)]
pub async fn clear_cart(
    State(state): State<AppState>,
    session: CartSession,
) -> AppResult<Json<ApiResponse<CartView>>> {
    let resp = cart_service::clear_cart(&state.pool, session.0).await?;
    Ok(Json(resp))
}
