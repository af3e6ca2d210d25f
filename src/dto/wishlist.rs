use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::WishlistEntry;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddWishlistRequest {
    pub product_id: Uuid,
    pub customer_email: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct WishlistQuery {
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct WishlistList {
    #[schema(value_type = Vec<WishlistEntry>)]
    pub items: Vec<WishlistEntry>,
}
