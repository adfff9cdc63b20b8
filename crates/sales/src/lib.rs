//! Sales domain module (cart and orders).
//!
//! This crate contains the shopping cart and the order lifecycle built on top
//! of variant resolution, implemented purely as deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod cart;
pub mod order;

pub use cart::{Cart, LineSnapshot};
pub use order::{Cancellation, Order, OrderStatus, ShopDetails};
