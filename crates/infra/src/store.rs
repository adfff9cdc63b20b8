//! Record stores for products and orders.
//!
//! The traits are synchronous and storage-agnostic; the in-memory
//! implementations back tests and local development.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use storefront_core::{BatchId, OrderId, ProductId, UserId};
use storefront_products::{Product, VariantStockTable};
use storefront_sales::Order;
use thiserror::Error;

/// Storage-level failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store lock poisoned: {0}")]
    Poisoned(&'static str),

    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("order not found: {0}")]
    OrderNotFound(OrderId),

    #[error("order already exists: {0}")]
    DuplicateOrder(OrderId),
}

/// Product records, keyed by id.
pub trait ProductStore: Send + Sync {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError>;
    fn upsert(&self, product: Product) -> Result<(), StoreError>;
    fn list(&self) -> Result<Vec<Product>, StoreError>;

    /// Read-modify-write the stock table of one product without interleaving
    /// with other writers. A product without a stock table is left as is.
    fn update_stock<R>(
        &self,
        id: ProductId,
        update: impl FnOnce(&mut VariantStockTable) -> R,
    ) -> Result<R, StoreError>;

    /// Run `update` over the given (distinct) products as one unit: the
    /// changes are written back only if it returns `Ok`.
    fn update_batch<R, E>(
        &self,
        ids: &[ProductId],
        update: impl FnOnce(&mut [Product]) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>;
}

/// Placed orders.
pub trait OrderStore: Send + Sync {
    fn insert(&self, order: Order) -> Result<(), StoreError>;
    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;
    /// Replace an existing order.
    fn update(&self, order: Order) -> Result<(), StoreError>;
    /// Run `change` on the stored order `id` under the store's write lock. The
    /// changed order is written back only if `change` returns `Ok`, so two
    /// concurrent transitions never both observe the same starting state.
    fn transition<R, E>(
        &self,
        id: OrderId,
        change: impl FnOnce(&mut Order) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>;
    /// Orders of one user, newest first.
    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError>;
    /// Orders of one checkout.
    fn list_batch(&self, batch_id: BatchId) -> Result<Vec<Order>, StoreError>;
}

impl<S: ProductStore> ProductStore for Arc<S> {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        (**self).get(id)
    }

    fn upsert(&self, product: Product) -> Result<(), StoreError> {
        (**self).upsert(product)
    }

    fn list(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list()
    }

    fn update_stock<R>(
        &self,
        id: ProductId,
        update: impl FnOnce(&mut VariantStockTable) -> R,
    ) -> Result<R, StoreError> {
        (**self).update_stock(id, update)
    }

    fn update_batch<R, E>(
        &self,
        ids: &[ProductId],
        update: impl FnOnce(&mut [Product]) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        (**self).update_batch(ids, update)
    }
}

impl<S: OrderStore> OrderStore for Arc<S> {
    fn insert(&self, order: Order) -> Result<(), StoreError> {
        (**self).insert(order)
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        (**self).get(id)
    }

    fn update(&self, order: Order) -> Result<(), StoreError> {
        (**self).update(order)
    }

    fn transition<R, E>(
        &self,
        id: OrderId,
        change: impl FnOnce(&mut Order) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        (**self).transition(id, change)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        (**self).list_for_user(user_id)
    }

    fn list_batch(&self, batch_id: BatchId) -> Result<Vec<Order>, StoreError> {
        (**self).list_batch(batch_id)
    }
}

/// In-memory product store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryProductStore {
    inner: RwLock<HashMap<ProductId, Product>>,
}

impl InMemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProductStore for InMemoryProductStore {
    fn get(&self, id: ProductId) -> Result<Option<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned("products"))?;
        Ok(map.get(&id).cloned())
    }

    fn upsert(&self, product: Product) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("products"))?;
        map.insert(product.id, product);
        Ok(())
    }

    fn list(&self) -> Result<Vec<Product>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned("products"))?;
        let mut products: Vec<Product> = map.values().cloned().collect();
        products.sort_by_key(|p| p.id);
        Ok(products)
    }

    fn update_stock<R>(
        &self,
        id: ProductId,
        update: impl FnOnce(&mut VariantStockTable) -> R,
    ) -> Result<R, StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("products"))?;
        let product = map.get_mut(&id).ok_or(StoreError::ProductNotFound(id))?;
        match product.variant_stock.as_mut() {
            Some(table) => Ok(update(table)),
            None => Ok(update(&mut VariantStockTable::new())),
        }
    }

    fn update_batch<R, E>(
        &self,
        ids: &[ProductId],
        update: impl FnOnce(&mut [Product]) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("products"))?;

        let mut working = Vec::with_capacity(ids.len());
        for id in ids {
            let product = map.get(id).ok_or(StoreError::ProductNotFound(*id))?;
            working.push(product.clone());
        }

        let out = update(&mut working)?;
        for product in working {
            map.insert(product.id, product);
        }
        Ok(out)
    }
}

/// In-memory order store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryOrderStore {
    inner: RwLock<HashMap<OrderId, Order>>,
}

impl InMemoryOrderStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn collect(&self, keep: impl Fn(&Order) -> bool) -> Result<Vec<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned("orders"))?;
        let mut orders: Vec<Order> = map.values().filter(|o| keep(o)).cloned().collect();
        orders.sort_by(|a, b| b.placed_at.cmp(&a.placed_at).then(a.id.cmp(&b.id)));
        Ok(orders)
    }
}

impl OrderStore for InMemoryOrderStore {
    fn insert(&self, order: Order) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("orders"))?;
        if map.contains_key(&order.id) {
            return Err(StoreError::DuplicateOrder(order.id));
        }
        map.insert(order.id, order);
        Ok(())
    }

    fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let map = self.inner.read().map_err(|_| StoreError::Poisoned("orders"))?;
        Ok(map.get(&id).cloned())
    }

    fn update(&self, order: Order) -> Result<(), StoreError> {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("orders"))?;
        match map.get_mut(&order.id) {
            Some(slot) => {
                *slot = order;
                Ok(())
            }
            None => Err(StoreError::OrderNotFound(order.id)),
        }
    }

    fn transition<R, E>(
        &self,
        id: OrderId,
        change: impl FnOnce(&mut Order) -> Result<R, E>,
    ) -> Result<R, E>
    where
        E: From<StoreError>,
    {
        let mut map = self.inner.write().map_err(|_| StoreError::Poisoned("orders"))?;
        let slot = map.get_mut(&id).ok_or(StoreError::OrderNotFound(id))?;
        let mut working = slot.clone();
        let out = change(&mut working)?;
        *slot = working;
        Ok(out)
    }

    fn list_for_user(&self, user_id: UserId) -> Result<Vec<Order>, StoreError> {
        self.collect(|o| o.user_id == user_id)
    }

    fn list_batch(&self, batch_id: BatchId) -> Result<Vec<Order>, StoreError> {
        self.collect(|o| o.batch_id == batch_id)
    }
}
