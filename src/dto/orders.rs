use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::checkout::{StockWarning, SubmissionOutcome, SubmissionReceipt};
use crate::models::Order;

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<Order>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RejectOrderRequest {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionView {
    pub order_id: Uuid,
    pub payment_slip_url: String,
    pub total_price: i64,
    pub outcome: SubmissionOutcome,
    pub stock_warnings: Vec<StockWarning>,
}

impl From<SubmissionReceipt> for SubmissionView {
    fn from(receipt: SubmissionReceipt) -> Self {
        let outcome = receipt.outcome();
        Self {
            order_id: receipt.order_id,
            payment_slip_url: receipt.payment_slip_url,
            total_price: receipt.total_price,
            outcome,
            stock_warnings: receipt.stock_warnings,
        }
    }
}
