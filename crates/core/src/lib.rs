//! Ojasritu Core - Shared domain types and rules.
//!
//! This crate provides the types used across the Ojasritu workspace:
//! - `storefront` - JSON API for the wellness storefront
//! - `cli` - Command-line tools for migrations, seeding and order sweeps
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Anything that can be decided without touching the
//! outside world (cart totals, order amounts, payment status transitions) lives
//! here so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, emails, money and status enums
//! - [`pricing`] - Cart line pricing and order amount arithmetic
//! - [`payment`] - Gateway status normalization and the payment transition guard
//! - [`slug`] - URL slug generation

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod payment;
pub mod pricing;
pub mod slug;
pub mod types;

pub use payment::{
    Reconciliation, RejectReason, format_order_reference, normalize_gateway_status, reconcile,
};
pub use pricing::{OrderAmounts, OrderAmountsError, PricedLine, cart_total};
pub use slug::slugify;
pub use types::*;
