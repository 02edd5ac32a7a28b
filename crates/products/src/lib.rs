//! Products domain module.
//!
//! This crate contains business rules for the product catalogue, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod price;
pub mod product;

pub use price::{format_price, parse_price};
pub use product::{Product, ProductDraft};
