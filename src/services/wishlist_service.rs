//! Restock-interest list. Customers leave an email against an out-of-stock
//! product; the back office reads the un-notified queue per product when new
//! stock lands. Actually sending the notification is outside this system.

use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::wishlist::{AddWishlistRequest, WishlistList},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::WishlistEntry,
    response::{ApiResponse, Meta},
};

pub async fn add_entry(
    pool: &DbPool,
    payload: AddWishlistRequest,
) -> AppResult<ApiResponse<WishlistEntry>> {
    let email = payload.customer_email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(AppError::BadRequest("a valid email is required".into()));
    }

    let product_exists: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(pool)
        .await?;
    if product_exists.is_none() {
        return Err(AppError::BadRequest("product not found".into()));
    }

    let existing: Option<WishlistEntry> = sqlx::query_as(
        "SELECT * FROM wishlists WHERE product_id = $1 AND customer_email = $2",
    )
    .bind(payload.product_id)
    .bind(&email)
    .fetch_optional(pool)
    .await?;

    let entry = if let Some(entry) = existing {
        entry
    } else {
        sqlx::query_as::<_, WishlistEntry>(
            r#"
            INSERT INTO wishlists (id, product_id, customer_email)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(payload.product_id)
        .bind(&email)
        .fetch_one(pool)
        .await?
    };

    if let Err(err) = log_audit(
        pool,
        None,
        "wishlist_add",
        Some("wishlists"),
        Some(serde_json::json!({ "product_id": payload.product_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Added to wishlist",
        entry,
        Some(Meta::empty()),
    ))
}

pub async fn list_for_email(pool: &DbPool, email: &str) -> AppResult<ApiResponse<WishlistList>> {
    let email = email.trim().to_lowercase();
    let items = sqlx::query_as::<_, WishlistEntry>(
        "SELECT * FROM wishlists WHERE customer_email = $1 ORDER BY created_at DESC",
    )
    .bind(&email)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "OK",
        WishlistList { items },
        Some(Meta::empty()),
    ))
}

pub async fn remove_entry(
    pool: &DbPool,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM wishlists WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Removed from wishlist",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Un-notified interest for one product, oldest first.
pub async fn pending_for_product(
    pool: &DbPool,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<WishlistList>> {
    ensure_admin(user)?;
    let items = sqlx::query_as::<_, WishlistEntry>(
        "SELECT * FROM wishlists WHERE product_id = $1 AND notified = FALSE ORDER BY created_at ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;

    Ok(ApiResponse::success(
        "Pending wishlist entries",
        WishlistList { items },
        Some(Meta::empty()),
    ))
}

pub async fn mark_notified(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<WishlistEntry>> {
    ensure_admin(user)?;
    let entry = sqlx::query_as::<_, WishlistEntry>(
        "UPDATE wishlists SET notified = TRUE WHERE id = $1 RETURNING *",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    let entry = match entry {
        Some(e) => e,
        None => return Err(AppError::NotFound),
    };

    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        "wishlist_notified",
        Some("wishlists"),
        Some(serde_json::json!({ "wishlist_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Marked notified", entry, Some(Meta::empty())))
}
