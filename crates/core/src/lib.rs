//! HotMeal Core - Shared types library.
//!
//! This crate provides the domain types used by every HotMeal client component:
//! - `hotmeal-client` - Session, request pipeline, route guard and cart/order models
//! - `hotmeal` (cli) - Command-line front end driving the client core
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access, no HTTP
//! clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, roles and order states

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
