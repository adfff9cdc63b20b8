//! Application services wiring the domain crates to the stores.

use chrono::Utc;
use rust_decimal::Decimal;
use thiserror::Error;

use storefront_core::{DomainError, OrderId, ProductId, UserId};
use storefront_products::{
    CatalogFilter, Facet, Product, Selection, SpecChoice, VariantSelector, brands, facet_values,
    max_price, normalize_stock_keys,
};
use storefront_sales::{Cart, Order, ShopDetails};

use crate::config::StorefrontConfig;
use crate::store::{OrderStore, ProductStore, StoreError};

/// Error returned by services.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("storage failure: {0}")]
    Store(#[from] StoreError),
}

impl ServiceError {
    /// Storage failures and stock races are worth retrying; validation
    /// failures are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ServiceError::Domain(e) => e.is_retryable(),
            ServiceError::Store(_) => true,
        }
    }
}

/// Everything a product page shows for the current selection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantView {
    pub product_id: ProductId,
    pub price: Decimal,
    /// `None` when the variant's stock is not tracked.
    pub stock: Option<i64>,
    pub image: String,
    pub available: bool,
    pub max_quantity: u32,
    pub options: Vec<SpecChoice>,
}

/// Filter choices offered for the whole catalog.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogFacets {
    pub brands: Vec<String>,
    pub ram: Vec<String>,
    pub storage: Vec<String>,
    pub max_price: Option<Decimal>,
}

/// Read side of the catalog plus stock-key maintenance.
#[derive(Debug, Clone)]
pub struct CatalogService<P> {
    products: P,
    config: StorefrontConfig,
}

impl<P: ProductStore> CatalogService<P> {
    pub fn new(products: P, config: StorefrontConfig) -> Self {
        Self { products, config }
    }

    pub fn product(&self, id: ProductId) -> Result<Product, ServiceError> {
        self.products
            .get(id)?
            .ok_or_else(|| DomainError::not_found().into())
    }

    /// Products passing `filter`, in store order.
    pub fn browse(&self, filter: &CatalogFilter) -> Result<Vec<Product>, ServiceError> {
        let products = self.products.list()?;
        let total = products.len();
        let matched: Vec<Product> = products.into_iter().filter(|p| filter.matches(p)).collect();
        tracing::debug!(
            total,
            matched = matched.len(),
            active = filter.is_active(),
            "catalog browsed"
        );
        Ok(matched)
    }

    /// Brands, spec facet values and price ceiling across every product.
    pub fn facets(&self) -> Result<CatalogFacets, ServiceError> {
        let products = self.products.list()?;
        Ok(CatalogFacets {
            brands: brands(&products),
            ram: facet_values(&products, Facet::Ram),
            storage: facet_values(&products, Facet::Storage),
            max_price: max_price(&products),
        })
    }

    /// Resolve `selection` on product `id`. `last_changed` is the key/value
    /// the shopper just picked, if any.
    pub fn view_variant(
        &self,
        id: ProductId,
        selection: &Selection,
        last_changed: Option<(&str, &str)>,
    ) -> Result<VariantView, ServiceError> {
        let product = self.product(id)?;
        let mut selector = VariantSelector::with_selection(&product, selection.clone())
            .with_placeholder(self.config.placeholder_image.as_str());
        if let Some((key, value)) = last_changed {
            selector.select(key, value);
        }

        Ok(VariantView {
            product_id: id,
            price: selector.price(),
            stock: selector.stock(),
            image: selector.image().to_string(),
            available: selector.is_available(),
            max_quantity: selector.max_quantity(self.config.max_untracked_quantity),
            options: selector.option_states(),
        })
    }

    /// Rewrite the stock keys of product `id` into canonical order so that
    /// restock and withdraw can address them. Returns the number of keys
    /// after the rewrite.
    pub fn normalize_stock(&self, id: ProductId) -> Result<usize, ServiceError> {
        let product = self.product(id)?;
        let schema = product.specifications;
        let (before, after) = self.products.update_stock(id, |table| {
            let before = table.len();
            *table = normalize_stock_keys(&schema, table);
            (before, table.len())
        })?;
        if before != after {
            tracing::info!(
                product_id = %id,
                before,
                after,
                "stock keys merged during normalization"
            );
        }
        Ok(after)
    }
}

/// Order placement, cancellation and delivery.
#[derive(Debug, Clone)]
pub struct OrderService<P, O> {
    products: P,
    orders: O,
    config: StorefrontConfig,
}

impl<P, O> OrderService<P, O>
where
    P: ProductStore,
    O: OrderStore,
{
    pub fn new(products: P, orders: O, config: StorefrontConfig) -> Self {
        Self {
            products,
            orders,
            config,
        }
    }

    /// Turn `cart` into one order batch and take the ordered units out of
    /// stock. Validation and stock withdrawal happen under one product-store
    /// write, so either every line is placed or nothing changes.
    pub fn place_cart(
        &self,
        user_id: UserId,
        cart: &Cart,
        shop: &ShopDetails,
    ) -> Result<Vec<Order>, ServiceError> {
        let mut ids: Vec<ProductId> = cart.lines().iter().map(|l| l.product_id).collect();
        ids.sort_unstable();
        ids.dedup();

        let ceiling = self.config.max_untracked_quantity;
        let orders = self.products.update_batch(&ids, |products| {
            let catalog: &[Product] = &*products;
            let orders = Order::place_batch(
                user_id,
                cart,
                shop,
                move |id| catalog.iter().find(|p| p.id == id),
                Utc::now(),
            )?;

            for order in &orders {
                let line = &order.line;
                let Some(product) = products.iter_mut().find(|p| p.id == line.product_id) else {
                    continue;
                };
                let tracked = product
                    .variant_stock
                    .as_mut()
                    .filter(|table| table.find_entry(&line.selection).is_some());
                match tracked {
                    Some(table) => {
                        table.withdraw_matching(&line.selection, line.quantity);
                    }
                    None if line.quantity > ceiling => {
                        return Err(ServiceError::from(DomainError::validation(format!(
                            "at most {ceiling} units of an untracked variant per order"
                        ))));
                    }
                    None => {}
                }
            }
            Ok::<_, ServiceError>(orders)
        })?;

        for order in &orders {
            self.orders.insert(order.clone())?;
        }

        if let Some(first) = orders.first() {
            tracing::info!(
                %user_id,
                batch_id = %first.batch_id,
                lines = orders.len(),
                "order batch placed"
            );
        }
        Ok(orders)
    }

    /// Cancel one of `user_id`'s orders, returning undelivered units to stock.
    ///
    /// The status change is committed first, atomically in the order store;
    /// only the caller that wins it restocks.
    pub fn cancel(&self, user_id: UserId, order_id: OrderId) -> Result<Order, ServiceError> {
        let (order, cancellation) = self.transition(order_id, |order| {
            if order.user_id != user_id {
                return Err(DomainError::Unauthorized.into());
            }
            let cancellation = order.cancel()?;
            Ok((order.clone(), cancellation))
        })?;

        if cancellation.restock {
            let restocked = self.products.update_stock(cancellation.product_id, |table| {
                table.restock_matching(&cancellation.selection, cancellation.quantity)
            });
            match restocked {
                Ok(true) => {}
                Ok(false) => {
                    tracing::warn!(%order_id, "cancelled order's variant has no stock key")
                }
                Err(StoreError::ProductNotFound(product_id)) => tracing::warn!(
                    %order_id,
                    %product_id,
                    "cancelled order's product no longer exists"
                ),
                Err(e) => {
                    tracing::error!(
                        %order_id,
                        error = %e,
                        "order cancelled but stock not returned"
                    );
                    return Err(e.into());
                }
            }
        }

        tracing::info!(%order_id, %user_id, restocked = cancellation.restock, "order cancelled");
        Ok(order)
    }

    pub fn mark_delivered(&self, order_id: OrderId) -> Result<Order, ServiceError> {
        let order = self.transition(order_id, |order| {
            order.mark_delivered()?;
            Ok(order.clone())
        })?;
        tracing::info!(%order_id, "order delivered");
        Ok(order)
    }

    pub fn orders_for(&self, user_id: UserId) -> Result<Vec<Order>, ServiceError> {
        Ok(self.orders.list_for_user(user_id)?)
    }

    /// Atomic status change; an unknown order is a domain `NotFound`.
    fn transition<R>(
        &self,
        order_id: OrderId,
        change: impl FnOnce(&mut Order) -> Result<R, ServiceError>,
    ) -> Result<R, ServiceError> {
        match self.orders.transition(order_id, change) {
            Err(ServiceError::Store(StoreError::OrderNotFound(_))) => {
                Err(DomainError::not_found().into())
            }
            other => other,
        }
    }
}
