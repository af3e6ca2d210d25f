use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    checkout::SlipUpload,
    dto::orders::SubmissionView,
    error::{AppError, AppResult},
    models::{Customer, Order},
    response::ApiResponse,
    routes::cart::CartSession,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(submit_order))
        .route("/{id}", get(get_order))
}

/// Multipart submission: customer fields plus the payment slip image. The
/// cart itself comes from the session snapshot, not the request body.
#[utoipa::path(
    post,
    path = "/api/orders",
    request_body(content_type = "multipart/form-data"),
    params(
        ("x-cart-session" = Uuid, Header, description = "Cart session key")
    ),
    responses(
        (status = 200, description = "Order received (possibly with stock-sync warnings)", body = ApiResponse<SubmissionView>),
        (status = 422, description = "Validation failed; nothing persisted"),
        (status = 502, description = "Slip upload or order store failed; nothing persisted"),
    ),
    tag = "Orders"
)]
pub async fn submit_order(
    State(state): State<AppState>,
    session: CartSession,
    mut multipart: Multipart,
) -> AppResult<Json<ApiResponse<SubmissionView>>> {
    let mut name = String::new();
    let mut phone = String::new();
    let mut address = String::new();
    let mut note: Option<String> = None;
    let mut slip: Option<SlipUpload> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        let field_name = field.name().map(str::to_owned);
        match field_name.as_deref() {
            Some("name") => name = read_text(field).await?,
            Some("phone") => phone = read_text(field).await?,
            Some("address") => address = read_text(field).await?,
            Some("note") => note = Some(read_text(field).await?),
            Some("slip") => {
                let content_type = field.content_type().unwrap_or_default().to_string();
                let file_name = field.file_name().unwrap_or("slip").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(format!("could not read slip: {e}")))?;
                slip = Some(SlipUpload {
                    bytes: bytes.to_vec(),
                    content_type,
                    file_name,
                });
            }
            _ => {}
        }
    }

    let customer = Customer {
        name,
        phone,
        address,
        note,
    };
    let resp = order_service::submit_for_session(&state, session.0, customer, slip).await?;
    Ok(Json(resp))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid form field: {e}")))
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order", body = ApiResponse<Order>),
        (status = 404, description = "Order not found"),
    ),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = order_service::get_order(&state.pool, id).await?;
    Ok(Json(resp))
}
