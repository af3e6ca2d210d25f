use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::CartLine;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
}

/// The quantity travels as a raw string; the cart store decides whether it
/// parses. Bad values are a silent no-op, mirroring the storefront input.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateQuantityRequest {
    pub quantity: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartView {
    pub lines: Vec<CartLine>,
    pub total_items: u64,
    pub total_price: i64,
}
