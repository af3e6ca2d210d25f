//! In-session shopping cart.
//!
//! `CartStore` owns the authoritative cart for one session: line items unique
//! per product, quantities aggregated on repeated adds, totals derived on
//! read. All mutations are synchronous; persistence happens around the store,
//! not inside it — callers load a snapshot, mutate, and wholesale-overwrite
//! the stored snapshot afterwards (see `services::cart_service`).
//!
//! Stock gates admission only: each `add_item` call checks the catalog stock
//! it is handed at that moment. There is no reservation and no cached
//! max-quantity clamp, so concurrent buyers can oversell — an accepted
//! limitation of this storefront.

use uuid::Uuid;

use crate::models::{CartLine, Product};

#[derive(Debug, Default)]
pub struct CartStore {
    lines: Vec<CartLine>,
}

impl CartStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a cart from a persisted snapshot. Corrupt data is not fatal:
    /// the customer gets an empty cart and we log what we threw away.
    pub fn from_snapshot(raw: &str) -> Self {
        match serde_json::from_str::<Vec<CartLine>>(raw) {
            Ok(lines) => Self { lines },
            Err(err) => {
                tracing::warn!(error = %err, "discarding unreadable cart snapshot");
                Self::new()
            }
        }
    }

    /// Serialize the full cart for wholesale persistence.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::to_value(&self.lines).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "cart snapshot serialization failed");
            serde_json::Value::Array(Vec::new())
        })
    }

    /// Add one unit of `product`. Out-of-stock products are silently ignored
    /// (the storefront greys them out; this is the backstop).
    pub fn add_item(&mut self, product: &Product) {
        if product.stock <= 0 {
            tracing::warn!(product_id = %product.id, "refusing to add out-of-stock product to cart");
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.price,
                quantity: 1,
            });
        }
    }

    pub fn remove_item(&mut self, product_id: Uuid) {
        self.lines.retain(|l| l.product_id != product_id);
    }

    /// Replace a line's quantity with a raw client-supplied value. Anything
    /// that does not parse to a positive number leaves the line untouched.
    pub fn update_quantity(&mut self, product_id: Uuid, raw: &str) {
        let Ok(value) = raw.trim().parse::<f64>() else {
            return;
        };
        if !value.is_finite() || value <= 0.0 {
            return;
        }
        let quantity = value.trunc() as u32;
        if quantity == 0 {
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product_id) {
            line.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    // u64: per-line quantities are u32, so a multi-line sum can exceed u32.
    pub fn total_items(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    pub fn total_price(&self) -> i64 {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}
