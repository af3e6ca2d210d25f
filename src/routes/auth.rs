use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, SessionResponse},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/session", get(session))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login admin", body = ApiResponse<LoginResponse>),
        (status = 401, description = "Unknown account or invalid credentials"),
        (status = 429, description = "Too many attempts"),
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login_admin(&state.pool, &state.logins, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout admin", body = ApiResponse<serde_json::Value>)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::logout_admin(&state.pool, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/session",
    responses(
        (status = 200, description = "Current session, if any", body = ApiResponse<SessionResponse>)
    ),
    tag = "Auth"
)]
pub async fn session(user: Option<AuthUser>) -> Json<ApiResponse<SessionResponse>> {
    let data = match user {
        Some(user) => SessionResponse {
            logged_in: true,
            admin_id: Some(user.admin_id),
            role: Some(user.role),
        },
        None => SessionResponse {
            logged_in: false,
            admin_id: None,
            role: None,
        },
    };
    Json(ApiResponse::success("Session", data, Some(Meta::empty())))
}
