use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::Product;

/// One product plus the quantity requested in a session's cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartLine {
    pub product: Product,
    pub quantity: u32,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.product.price * Decimal::from(self.quantity)
    }
}

/// In-memory shopping cart aggregate.
///
/// Holds an ordered sequence of lines, at most one per distinct product id.
/// The aggregate has no persistence and no concurrency control of its own;
/// sharing across tasks is the session adapter's concern.
#[derive(Debug, Clone, Default)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `quantity` of `product`, merging into an existing line when the
    /// product is already present. Always succeeds; no upper bound.
    pub fn add_item(&mut self, product: Product, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product.id) {
            line.quantity += quantity;
        } else {
            self.lines.push(CartLine { product, quantity });
        }
    }

    /// Removes the line for `product_id`; no-op when absent.
    pub fn remove_item(&mut self, product_id: &str) {
        self.lines.retain(|l| l.product.id != product_id);
    }

    /// Sets the quantity for `product_id` verbatim, zero included.
    ///
    /// Callers are responsible for routing a quantity of 0 to [`remove_item`]
    /// instead; the aggregate stores whatever it is given. The session adapter
    /// carries that guard.
    ///
    /// [`remove_item`]: Cart::remove_item
    pub fn update_quantity(&mut self, product_id: &str, quantity: u32) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.product.id == product_id) {
            line.quantity = quantity;
        }
    }

    /// Current total, recomputed from the lines on every call.
    pub fn total(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }
}
