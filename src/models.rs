use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::lifecycle::OrderStatus;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct AdminUser {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

/// Prices are stored in minor units (satang).
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub volume: Option<String>,
    pub notes: Option<String>,
    pub image_url: Option<String>,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

/// One product entry in a cart, with its quantity aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub unit_price: i64,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> i64 {
        self.unit_price.saturating_mul(i64::from(self.quantity))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    pub address: String,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub customer: Customer,
    /// Immutable snapshot of the cart at submission time.
    pub items: Vec<CartLine>,
    pub total_price: i64,
    pub payment_slip_url: String,
    pub status: OrderStatus,
    pub payment_approved: bool,
    pub rejection_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub rejected_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: Uuid,
    pub product_id: Uuid,
    pub customer_email: String,
    pub notified: bool,
    pub created_at: DateTime<Utc>,
}
