//! # Signet Common Library
//!
//! Shared code for the signet player core:
//! - Error types
//! - Event types (PlayerEvent enum) and the EventBus
//! - Player settings loading
//! - Stat database initialization
//! - Timestamp formatting for proof-of-play records

pub mod config;
pub mod db;
pub mod error;
pub mod events;
pub mod logging;
pub mod time;

pub use error::{Error, Result};
