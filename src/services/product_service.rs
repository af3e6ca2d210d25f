use uuid::Uuid;

use crate::{
    audit::log_audit,
    checkout::StockSource,
    db::DbPool,
    dto::products::{CreateProductRequest, ProductList, UpdateProductRequest},
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::Pagination,
};

pub async fn list_products(
    pool: &DbPool,
    pagination: Pagination,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = pagination.normalize();
    let items = sqlx::query_as::<_, Product>(
        "SELECT * FROM products ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await?;

    let total: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(meta),
    ))
}

pub async fn get_product(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Product>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success("Product", product, None))
}

pub async fn create_product(
    pool: &DbPool,
    user: &AuthUser,
    payload: CreateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;
    if payload.price < 0 || payload.stock < 0 {
        return Err(AppError::BadRequest(
            "price and stock must not be negative".into(),
        ));
    }

    let id = Uuid::new_v4();
    let product = sqlx::query_as::<_, Product>(
        r#"
        INSERT INTO products (id, name, description, price, volume, notes, image_url, stock)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(payload.name)
    .bind(payload.description)
    .bind(payload.price)
    .bind(payload.volume)
    .bind(payload.notes)
    .bind(payload.image_url)
    .bind(payload.stock)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        "product_create",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Product created",
        product,
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateProductRequest,
) -> AppResult<ApiResponse<Product>> {
    ensure_admin(user)?;

    let existing = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let existing = match existing {
        Some(p) => p,
        None => return Err(AppError::NotFound),
    };

    let name = payload.name.unwrap_or(existing.name);
    let description = payload.description.or(existing.description);
    let price = payload.price.unwrap_or(existing.price);
    let volume = payload.volume.or(existing.volume);
    let notes = payload.notes.or(existing.notes);
    let image_url = payload.image_url.or(existing.image_url);
    let stock = payload.stock.unwrap_or(existing.stock);
    if price < 0 || stock < 0 {
        return Err(AppError::BadRequest(
            "price and stock must not be negative".into(),
        ));
    }

    let product = sqlx::query_as::<_, Product>(
        r#"
        UPDATE products
        SET name = $2, description = $3, price = $4, volume = $5, notes = $6, image_url = $7, stock = $8
        WHERE id = $1
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .bind(price)
    .bind(volume)
    .bind(notes)
    .bind(image_url)
    .bind(stock)
    .fetch_one(pool)
    .await?;

    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        "product_update",
        Some("products"),
        Some(serde_json::json!({ "product_id": product.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success("Updated", product, Some(Meta::empty())))
}

pub async fn delete_product(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        "product_delete",
        Some("products"),
        Some(serde_json::json!({ "product_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Post-order stock sync. Clamped at zero on the database side so a late or
/// doubled decrement can never drive stock negative.
impl StockSource for DbPool {
    async fn decrease_stock(&self, product_id: Uuid, quantity: u32) -> anyhow::Result<i32> {
        let row: Option<(i32,)> = sqlx::query_as(
            "UPDATE products SET stock = GREATEST(stock - $2, 0) WHERE id = $1 RETURNING stock",
        )
        .bind(product_id)
        .bind(i64::from(quantity))
        .fetch_optional(self)
        .await?;

        let (stock,) =
            row.ok_or_else(|| anyhow::anyhow!("product {product_id} no longer exists"))?;
        Ok(stock)
    }
}
