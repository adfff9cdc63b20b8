use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use storefront_core::{BatchId, DomainError, DomainResult, OrderId, ProductId, UserId};
use storefront_products::{
    Product, Selection, is_available, pricing_key, resolve_price, resolve_stock,
};

use crate::cart::{Cart, LineSnapshot};

/// Delivery details of the buying shop. Both fields are required to order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopDetails {
    pub name: String,
    pub address: String,
}

impl ShopDetails {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() || self.address.trim().is_empty() {
            return Err(DomainError::validation(
                "shop name and address are required to place an order",
            ));
        }
        Ok(())
    }
}

/// Order status lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Processing,
    Delivered,
    Cancelled,
}

/// One placed order line. A checkout produces one order per cart line, all
/// sharing a `batch_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub batch_id: BatchId,
    pub user_id: UserId,
    pub line: LineSnapshot,
    pub shop: ShopDetails,
    pub status: OrderStatus,
    pub placed_at: DateTime<Utc>,
}

/// Outcome of cancelling an order: the units to put back, if any.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cancellation {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub selection: Selection,
    pub quantity: u32,
    /// `false` for orders that were already delivered.
    pub restock: bool,
}

impl Order {
    /// Turn every cart line into an order of one batch.
    ///
    /// Each line is re-validated against the current product: it must exist,
    /// not be listed as an exception, and fit in the tracked stock. Unit
    /// prices are re-resolved so the order records the price at placement.
    pub fn place_batch<'p, F>(
        user_id: UserId,
        cart: &Cart,
        shop: &ShopDetails,
        mut product_of: F,
        placed_at: DateTime<Utc>,
    ) -> DomainResult<Vec<Order>>
    where
        F: FnMut(ProductId) -> Option<&'p Product>,
    {
        if cart.is_empty() {
            return Err(DomainError::validation("cart is empty"));
        }
        shop.validate()?;

        let batch_id = BatchId::new();
        let mut orders = Vec::with_capacity(cart.len());

        for line in cart.lines() {
            let product = product_of(line.product_id).ok_or_else(DomainError::not_found)?;
            let unit_price = check_line(product, line)?;

            orders.push(Order {
                id: OrderId::new(),
                batch_id,
                user_id,
                line: LineSnapshot {
                    unit_price,
                    ..line.clone()
                },
                shop: shop.clone(),
                status: OrderStatus::Processing,
                placed_at,
            });
        }

        tracing::debug!(%batch_id, %user_id, orders = orders.len(), "order batch built");
        Ok(orders)
    }

    pub fn total(&self) -> Decimal {
        self.line.line_total()
    }

    pub fn is_open(&self) -> bool {
        self.status == OrderStatus::Processing
    }

    pub fn mark_delivered(&mut self) -> DomainResult<()> {
        match self.status {
            OrderStatus::Processing => {
                self.status = OrderStatus::Delivered;
                Ok(())
            }
            OrderStatus::Delivered => Err(DomainError::conflict("order already delivered")),
            OrderStatus::Cancelled => Err(DomainError::invariant(
                "cancelled orders cannot be delivered",
            )),
        }
    }

    /// Cancel the order. Stock is only returned when the goods never left.
    pub fn cancel(&mut self) -> DomainResult<Cancellation> {
        let restock = match self.status {
            OrderStatus::Processing => true,
            OrderStatus::Delivered => false,
            OrderStatus::Cancelled => return Err(DomainError::conflict("order already cancelled")),
        };
        self.status = OrderStatus::Cancelled;

        Ok(Cancellation {
            order_id: self.id,
            product_id: self.line.product_id,
            selection: self.line.selection.clone(),
            quantity: self.line.quantity,
            restock,
        })
    }
}

/// Validate one line against its product and return its current unit price.
fn check_line(product: &Product, line: &LineSnapshot) -> DomainResult<Decimal> {
    if line.quantity == 0 {
        return Err(DomainError::validation("quantity must be at least 1"));
    }
    if !is_available(product, &line.selection) {
        return Err(DomainError::unavailable(format!(
            "{} ({})",
            product.name,
            pricing_key(&line.selection)
        )));
    }
    if let Some(available) = resolve_stock(product, &line.selection) {
        if i64::from(line.quantity) > available {
            return Err(DomainError::InsufficientStock {
                requested: line.quantity,
                available,
            });
        }
    }
    Ok(resolve_price(product, &line.selection))
}
