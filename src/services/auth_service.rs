use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordVerifier},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    error::{AppError, AppResult, AuthError},
    middleware::auth::AuthUser,
    models::AdminUser,
    response::{ApiResponse, Meta},
};

const MAX_ATTEMPTS: u32 = 5;
const ATTEMPT_WINDOW: Duration = Duration::from_secs(15 * 60);

/// In-memory per-email failed-login window. Good enough for a single-process
/// back office; resets on restart.
#[derive(Debug, Default)]
pub struct LoginRateLimiter {
    attempts: Mutex<HashMap<String, (u32, Instant)>>,
}

impl LoginRateLimiter {
    // Attempt counts stay usable even if a panicking thread poisoned the lock.
    fn attempts(&self) -> std::sync::MutexGuard<'_, HashMap<String, (u32, Instant)>> {
        self.attempts.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn check(&self, email: &str) -> Result<(), AuthError> {
        let mut attempts = self.attempts();
        if let Some((count, since)) = attempts.get(email) {
            if since.elapsed() > ATTEMPT_WINDOW {
                attempts.remove(email);
            } else if *count >= MAX_ATTEMPTS {
                return Err(AuthError::RateLimited);
            }
        }
        Ok(())
    }

    pub fn record_failure(&self, email: &str) {
        let mut attempts = self.attempts();
        let entry = attempts
            .entry(email.to_string())
            .or_insert((0, Instant::now()));
        entry.0 += 1;
    }

    pub fn reset(&self, email: &str) {
        self.attempts().remove(email);
    }
}

pub async fn login_admin(
    pool: &DbPool,
    limiter: &LoginRateLimiter,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    limiter.check(&email)?;

    let admin: Option<AdminUser> =
        sqlx::query_as::<_, AdminUser>("SELECT * FROM admins WHERE email = $1")
            .bind(email.as_str())
            .fetch_optional(pool)
            .await?;

    let admin = match admin {
        Some(a) => a,
        None => {
            limiter.record_failure(&email);
            return Err(AuthError::UnknownAccount.into());
        }
    };

    let parsed_hash = PasswordHash::new(&admin.password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;

    let argon2 = Argon2::default();
    if argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_err()
    {
        limiter.record_failure(&email);
        return Err(AuthError::InvalidCredentials.into());
    }
    limiter.reset(&email);

    let secret = std::env::var("JWT_SECRET")
        .map_err(|_| AppError::Internal(anyhow::anyhow!("JWT_SECRET is not set")))?;

    let expiration = Utc::now()
        .checked_add_signed(chrono::Duration::hours(24))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: admin.id.to_string(),
        role: admin.role.clone(),
        exp: expiration.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    let resp = LoginResponse {
        token: format!("Bearer {}", token),
    };

    if let Err(err) = log_audit(
        pool,
        Some(admin.id),
        "admin_login",
        Some("admins"),
        Some(serde_json::json!({ "admin_id": admin.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

/// Tokens are stateless; logout just leaves an audit trail. The client drops
/// the token.
pub async fn logout_admin(
    pool: &DbPool,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        "admin_logout",
        Some("admins"),
        None,
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
