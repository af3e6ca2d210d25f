//! Order fulfillment state machine.
//!
//! Orders are created `pending` and move through a linear review flow driven
//! by back-office actions. `rejected` and `completed` are terminal. The HTTP
//! layer only offers legal actions, but every transition is still guarded here
//! so an out-of-order call fails instead of silently rewriting history.
//!
//! ```text
//! pending ──approve──► confirmed ──ship──► shipped ──complete──► completed
//!    └───────reject──► rejected
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::models::Order;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Rejected,
    Shipped,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Completed => "completed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Completed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "rejected" => Ok(OrderStatus::Rejected),
            "shipped" => Ok(OrderStatus::Shipped),
            "completed" => Ok(OrderStatus::Completed),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown order status {0:?}")]
pub struct UnknownStatus(pub String);

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("cannot {action} an order that is {from}")]
    IllegalTransition {
        from: OrderStatus,
        action: &'static str,
    },

    #[error("order has no payment slip to review")]
    MissingPaymentSlip,
}

/// Approve the payment slip: `pending -> confirmed`.
///
/// Review actions only exist for orders that actually carry a slip.
pub fn approve(order: &mut Order) -> Result<(), LifecycleError> {
    if order.status != OrderStatus::Pending {
        return Err(LifecycleError::IllegalTransition {
            from: order.status,
            action: "approve",
        });
    }
    if order.payment_slip_url.trim().is_empty() {
        return Err(LifecycleError::MissingPaymentSlip);
    }

    let now = Utc::now();
    order.status = OrderStatus::Confirmed;
    order.payment_approved = true;
    order.approved_at = Some(now);
    order.updated_at = now;
    Ok(())
}

/// Reject the payment slip: `pending -> rejected` (terminal).
pub fn reject(order: &mut Order, reason: Option<String>) -> Result<(), LifecycleError> {
    if order.status != OrderStatus::Pending {
        return Err(LifecycleError::IllegalTransition {
            from: order.status,
            action: "reject",
        });
    }
    if order.payment_slip_url.trim().is_empty() {
        return Err(LifecycleError::MissingPaymentSlip);
    }

    let now = Utc::now();
    order.status = OrderStatus::Rejected;
    order.payment_approved = false;
    order.rejection_reason = Some(reason.unwrap_or_default());
    order.rejected_at = Some(now);
    order.updated_at = now;
    Ok(())
}

/// `confirmed -> shipped`.
pub fn advance_to_shipped(order: &mut Order) -> Result<(), LifecycleError> {
    if order.status != OrderStatus::Confirmed {
        return Err(LifecycleError::IllegalTransition {
            from: order.status,
            action: "ship",
        });
    }
    order.status = OrderStatus::Shipped;
    order.updated_at = Utc::now();
    Ok(())
}

/// `shipped -> completed` (terminal).
pub fn mark_completed(order: &mut Order) -> Result<(), LifecycleError> {
    if order.status != OrderStatus::Shipped {
        return Err(LifecycleError::IllegalTransition {
            from: order.status,
            action: "complete",
        });
    }
    order.status = OrderStatus::Completed;
    order.updated_at = Utc::now();
    Ok(())
}
