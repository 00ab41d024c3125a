//! Parties referenced by orders: customers and enterprises.
//!
//! Record management for these lives elsewhere; this crate only models the
//! fields orders hydrate and the minimal rules for constructing them.

pub mod party;

pub use party::{ContactInfo, Customer, Enterprise};
