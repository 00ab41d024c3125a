//! Product catalog records.
//!
//! A product belongs to exactly one enterprise and embeds its own stock
//! counter (an `orderdesk_inventory::StockLevel`). Orders reference products
//! and snapshot their name and price; they never own them.

pub mod product;

pub use product::{MAX_DESCRIPTION_LEN, MAX_NAME_LEN, MAX_PRICE, NewProduct, Product};
