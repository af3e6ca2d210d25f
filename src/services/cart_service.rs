//! Session cart plumbing: load the persisted snapshot, rebuild the cart
//! store, apply one mutation, then overwrite the snapshot wholesale. The
//! snapshot is the single source of truth between requests, exactly one row
//! per session key.

use uuid::Uuid;

use crate::{
    cart::CartStore,
    db::DbPool,
    dto::cart::CartView,
    error::{AppError, AppResult},
    models::Product,
    response::{ApiResponse, Meta},
};

pub async fn load_cart(pool: &DbPool, session_key: Uuid) -> AppResult<CartStore> {
    let row: Option<(serde_json::Value,)> =
        sqlx::query_as("SELECT lines FROM cart_snapshots WHERE session_key = $1")
            .bind(session_key)
            .fetch_optional(pool)
            .await?;

    Ok(match row {
        Some((lines,)) => CartStore::from_snapshot(&lines.to_string()),
        None => CartStore::new(),
    })
}

pub async fn save_cart(pool: &DbPool, session_key: Uuid, cart: &CartStore) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO cart_snapshots (session_key, lines, updated_at)
        VALUES ($1, $2, now())
        ON CONFLICT (session_key)
        DO UPDATE SET lines = EXCLUDED.lines, updated_at = now()
        "#,
    )
    .bind(session_key)
    .bind(cart.snapshot())
    .execute(pool)
    .await?;
    Ok(())
}

fn view_of(cart: &CartStore) -> CartView {
    CartView {
        lines: cart.lines().to_vec(),
        total_items: cart.total_items(),
        total_price: cart.total_price(),
    }
}

pub async fn view_cart(pool: &DbPool, session_key: Uuid) -> AppResult<ApiResponse<CartView>> {
    let cart = load_cart(pool, session_key).await?;
    Ok(ApiResponse::success("OK", view_of(&cart), Some(Meta::empty())))
}

pub async fn add_item(
    pool: &DbPool,
    session_key: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".into())),
    };

    let mut cart = load_cart(pool, session_key).await?;
    cart.add_item(&product);
    save_cart(pool, session_key, &cart).await?;

    Ok(ApiResponse::success(
        "Cart updated",
        view_of(&cart),
        Some(Meta::empty()),
    ))
}

pub async fn update_quantity(
    pool: &DbPool,
    session_key: Uuid,
    product_id: Uuid,
    raw_quantity: &str,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(pool, session_key).await?;
    cart.update_quantity(product_id, raw_quantity);
    save_cart(pool, session_key, &cart).await?;

    Ok(ApiResponse::success(
        "Cart updated",
        view_of(&cart),
        Some(Meta::empty()),
    ))
}

pub async fn remove_item(
    pool: &DbPool,
    session_key: Uuid,
    product_id: Uuid,
) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(pool, session_key).await?;
    cart.remove_item(product_id);
    save_cart(pool, session_key, &cart).await?;

    Ok(ApiResponse::success(
        "Removed from cart",
        view_of(&cart),
        Some(Meta::empty()),
    ))
}

pub async fn clear_cart(pool: &DbPool, session_key: Uuid) -> AppResult<ApiResponse<CartView>> {
    let mut cart = load_cart(pool, session_key).await?;
    cart.clear();
    save_cart(pool, session_key, &cart).await?;

    Ok(ApiResponse::success(
        "Cart cleared",
        view_of(&cart),
        Some(Meta::empty()),
    ))
}
