//! Integration tests for the checkout pipeline.
//!
//! Tests: stored product -> variant view -> cart -> order batch -> stock
//!
//! Verifies:
//! - Product records decoded from JSON resolve like hand-built ones
//! - Placing a cart withdraws stock for every line, or for none
//! - Cancelling returns undelivered units to stock exactly once

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;
    use serde_json::json;

    use storefront_core::{DomainError, ProductId, UserId};
    use storefront_products::{CatalogFilter, Facet, Product, Selection};
    use storefront_sales::{Cart, LineSnapshot, OrderStatus, ShopDetails};

    use crate::config::StorefrontConfig;
    use crate::service::{CatalogService, OrderService, ServiceError};
    use crate::store::{InMemoryOrderStore, InMemoryProductStore, OrderStore, ProductStore};

    type Products = Arc<InMemoryProductStore>;
    type Orders = Arc<InMemoryOrderStore>;

    fn phone_record(id: ProductId) -> Product {
        let raw = json!({
            "id": id.to_string(),
            "name": "Phone X",
            "brand": "Acme",
            "price": 20000,
            "image": "/img/phone.png",
            "specifications": {
                "_ordered": [
                    { "key": "Color", "values": [
                        { "value": "Black", "color": "#000000", "image": "/img/black.png" },
                        { "value": "Blue", "color": "#0000ff" }
                    ]},
                    { "key": "RAM", "values": ["8GB", "12GB"] },
                    { "key": "Storage", "values": ["128GB", "256GB"] },
                    { "key": "Brand", "values": "Acme" }
                ]
            },
            "variant_pricing": {
                "variants": {
                    "8GB_128GB": 22000,
                    "12GB_256GB": { "originalPrice": 30000, "discountedPrice": 27000 }
                }
            },
            "variant_stock": {
                "Color: Black | RAM: 8GB | Storage: 128GB": 5,
                "Color: Blue | RAM: 8GB | Storage: 128GB": 1,
                "Color: Black | RAM: 12GB | Storage: 256GB": 0
            },
            "variant_exceptions": ["12GB_128GB"]
        });
        serde_json::from_value(raw).unwrap()
    }

    fn cable_record(id: ProductId) -> Product {
        serde_json::from_value(json!({
            "id": id.to_string(),
            "name": "Cable",
            "price": "350",
            "specifications": { "Length": ["1m", "2m"] },
            "variant_pricing": null,
            "variant_stock": "not-a-table"
        }))
        .unwrap()
    }

    fn setup() -> (Products, CatalogService<Products>, OrderService<Products, Orders>) {
        let products: Products = Arc::new(InMemoryProductStore::new());
        let orders: Orders = Arc::new(InMemoryOrderStore::new());
        let config = StorefrontConfig::default();
        let catalog = CatalogService::new(products.clone(), config.clone());
        let service = OrderService::new(products.clone(), orders, config);
        (products, catalog, service)
    }

    fn sel(color: &str, ram: &str, storage: &str) -> Selection {
        Selection::new()
            .with("Color", color)
            .with("RAM", ram)
            .with("Storage", storage)
    }

    fn shop() -> ShopDetails {
        ShopDetails::new("Corner Shop", "12 High Street")
    }

    fn stock_of(products: &Products, id: ProductId, key: &str) -> Option<i64> {
        products
            .get(id)
            .unwrap()
            .and_then(|p| p.stock().and_then(|t| t.get(key)))
    }

    #[test]
    fn view_resolves_price_stock_image_and_availability() {
        let (products, catalog, _) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();

        let view = catalog
            .view_variant(id, &sel("Black", "8GB", "128GB"), Some(("Color", "Black")))
            .unwrap();
        assert_eq!(view.price, Decimal::from(22000));
        assert_eq!(view.stock, Some(5));
        assert_eq!(view.image, "/img/black.png");
        assert!(view.available);
        assert_eq!(view.max_quantity, 5);
        assert_eq!(view.options.len(), 3);

        let view = catalog
            .view_variant(id, &sel("Black", "12GB", "256GB"), None)
            .unwrap();
        assert_eq!(view.price, Decimal::from(27000));
        assert_eq!(view.stock, Some(0));

        let view = catalog
            .view_variant(id, &sel("Blue", "12GB", "128GB"), Some(("Color", "Blue")))
            .unwrap();
        assert!(!view.available);
        assert_eq!(view.image, "/img/phone.png");
        assert_eq!(view.stock, None);
        assert_eq!(view.max_quantity, 999);
    }

    #[test]
    fn malformed_tables_degrade_to_defaults() {
        let (products, catalog, _) = setup();
        let id = ProductId::new();
        products.upsert(cable_record(id)).unwrap();

        let view = catalog
            .view_variant(id, &Selection::new().with("Length", "2m"), None)
            .unwrap();
        assert_eq!(view.price, Decimal::from(350));
        assert_eq!(view.stock, None);
        assert_eq!(view.image, "/placeholder.svg");
        assert!(view.available);
    }

    #[test]
    fn unknown_product_is_not_found() {
        let (_, catalog, _) = setup();
        assert_eq!(
            catalog.view_variant(ProductId::new(), &Selection::new(), None),
            Err(ServiceError::Domain(DomainError::NotFound))
        );
    }

    #[test]
    fn placing_a_cart_withdraws_stock_per_line() {
        let (products, _, service) = setup();
        let (phone_id, cable_id) = (ProductId::new(), ProductId::new());
        products.upsert(phone_record(phone_id)).unwrap();
        products.upsert(cable_record(cable_id)).unwrap();
        let phone = products.get(phone_id).unwrap().unwrap();
        let cable = products.get(cable_id).unwrap().unwrap();

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "/img/black.png", 2));
        cart.add(LineSnapshot::capture(&phone, sel("Blue", "8GB", "128GB"), "/img/phone.png", 1));
        cart.add(LineSnapshot::capture(&cable, Selection::new().with("Length", "1m"), "", 10));

        let user = UserId::new();
        let orders = service.place_cart(user, &cart, &shop()).unwrap();
        assert_eq!(orders.len(), 3);
        assert!(orders.iter().all(|o| o.batch_id == orders[0].batch_id));

        let black = "Color: Black | RAM: 8GB | Storage: 128GB";
        let blue = "Color: Blue | RAM: 8GB | Storage: 128GB";
        assert_eq!(stock_of(&products, phone_id, black), Some(3));
        assert_eq!(stock_of(&products, phone_id, blue), Some(0));
        assert_eq!(service.orders_for(user).unwrap().len(), 3);
    }

    #[test]
    fn failing_line_leaves_all_stock_untouched() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "", 2));
        cart.add(LineSnapshot::capture(&phone, sel("Blue", "8GB", "128GB"), "", 4));

        let err = service.place_cart(UserId::new(), &cart, &shop()).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Domain(DomainError::InsufficientStock {
                requested: 4,
                available: 1
            })
        );
        assert!(err.is_retryable());
        assert_eq!(stock_of(&products, id, "Color: Black | RAM: 8GB | Storage: 128GB"), Some(5));
    }

    #[test]
    fn untracked_lines_are_capped_by_config() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(cable_record(id)).unwrap();
        let cable = products.get(id).unwrap().unwrap();

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&cable, Selection::new(), "", 1000));
        let err = service.place_cart(UserId::new(), &cart, &shop()).unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
        assert!(!err.is_retryable());
    }

    #[test]
    fn cancel_restocks_processing_orders_once() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();
        let key = "Color: Black | RAM: 8GB | Storage: 128GB";

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "", 2));
        let user = UserId::new();
        let order = service.place_cart(user, &cart, &shop()).unwrap().remove(0);
        assert_eq!(stock_of(&products, id, key), Some(3));

        assert_eq!(
            service.cancel(UserId::new(), order.id),
            Err(ServiceError::Domain(DomainError::Unauthorized))
        );

        let cancelled = service.cancel(user, order.id).unwrap();
        assert_eq!(cancelled.status, OrderStatus::Cancelled);
        assert_eq!(stock_of(&products, id, key), Some(5));

        assert!(matches!(
            service.cancel(user, order.id),
            Err(ServiceError::Domain(DomainError::Conflict(_)))
        ));
        assert_eq!(stock_of(&products, id, key), Some(5));
    }

    #[test]
    fn cancelling_a_delivered_order_does_not_restock() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();
        let key = "Color: Black | RAM: 8GB | Storage: 128GB";

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "", 1));
        let user = UserId::new();
        let order = service.place_cart(user, &cart, &shop()).unwrap().remove(0);

        let delivered = service.mark_delivered(order.id).unwrap();
        assert_eq!(delivered.status, OrderStatus::Delivered);

        service.cancel(user, order.id).unwrap();
        assert_eq!(stock_of(&products, id, key), Some(4));
    }

    #[test]
    fn normalize_stock_merges_legacy_keys() {
        let (products, catalog, _) = setup();
        let id = ProductId::new();
        let mut phone = phone_record(id);
        if let Some(table) = phone.variant_stock.as_mut() {
            table.set("Storage: 128GB | ram: 8GB | color: Black", 2);
        }
        products.upsert(phone).unwrap();

        assert_eq!(catalog.normalize_stock(id).unwrap(), 3);
        assert_eq!(
            stock_of(&products, id, "Color: Black | RAM: 8GB | Storage: 128GB"),
            Some(7)
        );
    }

    fn legacy_keyed_record(id: ProductId) -> Product {
        serde_json::from_value(json!({
            "id": id.to_string(),
            "name": "Phone Lite",
            "price": 9000,
            "specifications": {
                "Color": [{ "value": "Black" }],
                "Ram": ["8GB"]
            },
            "variant_stock": { "Ram: 8GB | Color: Black": 2 }
        }))
        .unwrap()
    }

    #[test]
    fn legacy_stock_keys_are_withdrawn_and_restocked() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(legacy_keyed_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();
        let key = "Ram: 8GB | Color: Black";
        let selection = Selection::new().with("Color", "Black").with("Ram", "8GB");

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, selection, "", 2));
        let user = UserId::new();

        let order = service.place_cart(user, &cart, &shop()).unwrap().remove(0);
        assert_eq!(stock_of(&products, id, key), Some(0));

        let err = service.place_cart(user, &cart, &shop()).unwrap_err();
        assert_eq!(
            err,
            ServiceError::Domain(DomainError::InsufficientStock {
                requested: 2,
                available: 0
            })
        );

        service.cancel(user, order.id).unwrap();
        assert_eq!(stock_of(&products, id, key), Some(2));
    }

    #[test]
    fn concurrent_cancels_restock_once() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();
        let key = "Color: Black | RAM: 8GB | Storage: 128GB";

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "", 3));
        let user = UserId::new();
        let order = service.place_cart(user, &cart, &shop()).unwrap().remove(0);
        assert_eq!(stock_of(&products, id, key), Some(2));

        let succeeded = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| service.cancel(user, order.id).is_ok()))
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap())
                .filter(|ok| *ok)
                .count()
        });

        assert_eq!(succeeded, 1);
        assert_eq!(stock_of(&products, id, key), Some(5));
    }

    #[test]
    fn unknown_order_is_not_found() {
        let (_, _, service) = setup();
        assert_eq!(
            service.cancel(UserId::new(), storefront_core::OrderId::new()),
            Err(ServiceError::Domain(DomainError::NotFound))
        );
        assert_eq!(
            service.mark_delivered(storefront_core::OrderId::new()),
            Err(ServiceError::Domain(DomainError::NotFound))
        );
    }

    #[test]
    fn browse_filters_stored_products_by_facets() {
        let (products, catalog, _) = setup();
        let (phone_id, cable_id) = (ProductId::new(), ProductId::new());
        products.upsert(phone_record(phone_id)).unwrap();
        products.upsert(cable_record(cable_id)).unwrap();

        let facets = catalog.facets().unwrap();
        assert_eq!(facets.brands, ["Acme"]);
        assert_eq!(facets.ram, ["12GB", "8GB"]);
        assert_eq!(facets.storage, ["128GB", "256GB"]);
        assert_eq!(facets.max_price, Some(Decimal::from(20000)));

        let all = catalog.browse(&CatalogFilter::new()).unwrap();
        assert_eq!(all.len(), 2);

        let phones = catalog
            .browse(&CatalogFilter::new().with_facet(Facet::Storage, "256GB"))
            .unwrap();
        assert_eq!(phones.len(), 1);
        assert_eq!(phones[0].id, phone_id);

        let cheap = CatalogFilter::new().with_price_range(None, Some(Decimal::from(1000)));
        let found = catalog.browse(&cheap.with_search("cable")).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, cable_id);
    }

    #[test]
    fn missing_shop_details_reject_the_checkout() {
        let (products, _, service) = setup();
        let id = ProductId::new();
        products.upsert(phone_record(id)).unwrap();
        let phone = products.get(id).unwrap().unwrap();

        let mut cart = Cart::new();
        cart.add(LineSnapshot::capture(&phone, sel("Black", "8GB", "128GB"), "", 1));
        let err = service
            .place_cart(UserId::new(), &cart, &ShopDetails::new("Shop", ""))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Domain(DomainError::Validation(_))));
    }
}
