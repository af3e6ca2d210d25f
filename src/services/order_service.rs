use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    cart::CartStore,
    checkout::{self, OrderDraft, OrderSink, SlipUpload, SubmissionRequest},
    db::DbPool,
    dto::orders::{OrderList, SubmissionView},
    error::{AppError, AppResult},
    lifecycle::{self, OrderStatus},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Customer, Order},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::cart_service,
    state::AppState,
};

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    customer_name: String,
    customer_phone: String,
    customer_address: String,
    customer_note: Option<String>,
    items: serde_json::Value,
    total_price: i64,
    payment_slip_url: String,
    status: String,
    payment_approved: bool,
    rejection_reason: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    approved_at: Option<DateTime<Utc>>,
    rejected_at: Option<DateTime<Utc>>,
}

fn order_from_row(row: OrderRow) -> AppResult<Order> {
    let status: OrderStatus = row
        .status
        .parse()
        .map_err(|e| AppError::Internal(anyhow::anyhow!("{e}")))?;
    let items = serde_json::from_value(row.items)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("order items snapshot unreadable: {e}")))?;

    Ok(Order {
        id: row.id,
        customer: Customer {
            name: row.customer_name,
            phone: row.customer_phone,
            address: row.customer_address,
            note: row.customer_note,
        },
        items,
        total_price: row.total_price,
        payment_slip_url: row.payment_slip_url,
        status,
        payment_approved: row.payment_approved,
        rejection_reason: row.rejection_reason,
        created_at: row.created_at,
        updated_at: row.updated_at,
        approved_at: row.approved_at,
        rejected_at: row.rejected_at,
    })
}

/// Orders always enter the store as `pending`; the caller never picks a
/// status.
impl OrderSink for DbPool {
    async fn create_order(&self, draft: &OrderDraft) -> anyhow::Result<Uuid> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"
            INSERT INTO orders
                (id, customer_name, customer_phone, customer_address, customer_note,
                 items, total_price, payment_slip_url, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&draft.customer.name)
        .bind(&draft.customer.phone)
        .bind(&draft.customer.address)
        .bind(&draft.customer.note)
        .bind(serde_json::to_value(&draft.items)?)
        .bind(draft.total_price)
        .bind(&draft.payment_slip_url)
        .bind(OrderStatus::Pending.as_str())
        .execute(self)
        .await?;
        Ok(id)
    }
}

/// Customer-facing submission: cart lines come from the session snapshot,
/// the slip from the multipart body. On success the cart is cleared; on any
/// failure it is left exactly as it was.
pub async fn submit_for_session(
    state: &AppState,
    session_key: Uuid,
    customer: Customer,
    slip: Option<SlipUpload>,
) -> AppResult<ApiResponse<SubmissionView>> {
    let cart = cart_service::load_cart(&state.pool, session_key).await?;

    let request = SubmissionRequest {
        customer,
        lines: cart.lines().to_vec(),
        slip,
    };
    let receipt = checkout::submit_order(&state.media, &state.pool, &state.pool, request).await?;

    forget_session_cart(&state.pool, session_key, receipt.order_id).await;

    if let Err(err) = log_audit(
        &state.pool,
        None,
        "order_submitted",
        Some("orders"),
        Some(serde_json::json!({
            "order_id": receipt.order_id,
            "total_price": receipt.total_price,
            "stock_warnings": receipt.stock_warnings.len(),
        })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    let message = if receipt.stock_warnings.is_empty() {
        "Order received"
    } else {
        "Order received; stock sync pending"
    };
    Ok(ApiResponse::success(
        message,
        SubmissionView::from(receipt),
        Some(Meta::empty()),
    ))
}

/// Empty the session cart after placement. Best-effort like the stock sync:
/// the order is already placed, so a failed write is logged and swallowed; a
/// stale cart just resurfaces on the customer's next request.
pub async fn forget_session_cart(pool: &DbPool, session_key: Uuid, order_id: Uuid) {
    if let Err(err) = cart_service::save_cart(pool, session_key, &CartStore::new()).await {
        tracing::warn!(
            session_key = %session_key,
            order_id = %order_id,
            error = %err,
            "cart clear failed after order placement"
        );
    }
}

pub async fn get_order(pool: &DbPool, id: Uuid) -> AppResult<ApiResponse<Order>> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    let row = match row {
        Some(r) => r,
        None => return Err(AppError::NotFound),
    };
    Ok(ApiResponse::success(
        "Order",
        order_from_row(row)?,
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    pool: &DbPool,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination().normalize();
    let sort = query.sort_order.unwrap_or(SortOrder::Desc);
    let status_filter = query.status.filter(|s| !s.is_empty());

    // Newest-created first by default, matching the review queue.
    let sql = format!(
        "SELECT * FROM orders WHERE ($1::text IS NULL OR status = $1) \
         ORDER BY created_at {} LIMIT $2 OFFSET $3",
        sort.as_sql()
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(&status_filter)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    let total: (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
            .bind(&status_filter)
            .fetch_one(pool)
            .await?;

    let items = rows
        .into_iter()
        .map(order_from_row)
        .collect::<AppResult<Vec<_>>>()?;

    let meta = Meta::new(page, limit, total.0);
    Ok(ApiResponse::success("Orders", OrderList { items }, Some(meta)))
}

pub async fn get_order_admin(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    get_order(pool, id).await
}

async fn fetch_order(pool: &DbPool, id: Uuid) -> AppResult<Order> {
    let row = sqlx::query_as::<_, OrderRow>("SELECT * FROM orders WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await?;
    match row {
        Some(r) => order_from_row(r),
        None => Err(AppError::NotFound),
    }
}

async fn persist_transition(pool: &DbPool, order: &Order) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE orders
        SET status = $2, payment_approved = $3, rejection_reason = $4,
            updated_at = $5, approved_at = $6, rejected_at = $7
        WHERE id = $1
        "#,
    )
    .bind(order.id)
    .bind(order.status.as_str())
    .bind(order.payment_approved)
    .bind(&order.rejection_reason)
    .bind(order.updated_at)
    .bind(order.approved_at)
    .bind(order.rejected_at)
    .execute(pool)
    .await?;
    Ok(())
}

async fn audit_transition(pool: &DbPool, user: &AuthUser, action: &str, order: &Order) {
    if let Err(err) = log_audit(
        pool,
        Some(user.admin_id),
        action,
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "status": order.status.as_str() })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }
}

pub async fn approve_order(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let mut order = fetch_order(pool, id).await?;
    lifecycle::approve(&mut order)?;
    persist_transition(pool, &order).await?;
    audit_transition(pool, user, "order_approve", &order).await;
    Ok(ApiResponse::success(
        "Payment approved",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn reject_order(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
    reason: Option<String>,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let mut order = fetch_order(pool, id).await?;
    lifecycle::reject(&mut order, reason)?;
    persist_transition(pool, &order).await?;
    audit_transition(pool, user, "order_reject", &order).await;
    Ok(ApiResponse::success(
        "Payment rejected",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn ship_order(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let mut order = fetch_order(pool, id).await?;
    lifecycle::advance_to_shipped(&mut order)?;
    persist_transition(pool, &order).await?;
    audit_transition(pool, user, "order_ship", &order).await;
    Ok(ApiResponse::success(
        "Order shipped",
        order,
        Some(Meta::empty()),
    ))
}

pub async fn complete_order(
    pool: &DbPool,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    ensure_admin(user)?;
    let mut order = fetch_order(pool, id).await?;
    lifecycle::mark_completed(&mut order)?;
    persist_transition(pool, &order).await?;
    audit_transition(pool, user, "order_complete", &order).await;
    Ok(ApiResponse::success(
        "Order completed",
        order,
        Some(Meta::empty()),
    ))
}
