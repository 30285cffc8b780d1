//! Storage Layer
//!
//! Handles data persistence: the SQLite store and the JSON config file.

pub mod config;
pub mod database;
pub mod store;

pub use config::*;
pub use database::*;
pub use store::*;
