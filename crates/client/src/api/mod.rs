//! Thin wrappers over the backend's REST endpoints.
//!
//! Each function fixes method, path and body shape and returns typed data.
//! Failures are classified and reported by [`RequestClient`](crate::request::RequestClient);
//! wrappers add no handling of their own.

pub mod areas;
pub mod auth;
pub mod categories;
pub mod dishes;
pub mod orders;
pub mod types;

pub use types::{
    AuthPayload, Category, DiningArea, Dish, Order, OrderItem, OrderUpdate, User,
};
