//! Stock reconciliation core.
//!
//! This crate contains the validate-then-apply planning logic for scanned
//! stock batches, implemented purely as deterministic domain logic (no IO,
//! no HTTP, no storage). The store wraps the resulting plan in a single
//! transaction.

pub mod reconcile;

pub use reconcile::{CoalescedLine, QuantityChange, ScanLine, UpdateEvent, coalesce, plan};
