//! Domain models for the storefront.
//!
//! Row types derive `sqlx::FromRow` and `Serialize`, so most of them go
//! straight from a query to a JSON response.

pub mod cart;
pub mod catalog;
pub mod content;
pub mod order;
pub mod rebooking;
pub mod session;
pub mod support;
pub mod user;

pub use session::{CurrentUser, keys as session_keys};
pub use user::User;
