//! Portico Core
//!
//! Core domain types, traits, and error handling for the Portico gateway.
//! This crate has minimal dependencies and defines the shared vocabulary
//! used by the cache stores, the offline layer, and the gateway server.

pub mod cache;
pub mod classify;
pub mod error;
pub mod ids;
pub mod ports;
pub mod request;
pub mod session;

pub use error::{Error, Result};
pub use ids::*;
