//! Parties domain module.
//!
//! Manufacturers and suppliers share one shape (a unique name referenced by
//! zero or more products), so both are modelled as a `Party` distinguished
//! by `PartyKind`. The store keeps them in separate tables.

pub mod party;

pub use party::{Party, PartyKind, PartyRef, validate_party_name};
