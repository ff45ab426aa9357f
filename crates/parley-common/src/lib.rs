//! Parley Common - Shared utilities and types
//!
//! This crate provides the error type, configuration structs, message types
//! and utility functions used across all Parley components.

pub mod config;
pub mod constants;
pub mod error;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::{DefaultsConfig, ParleyConfig, ProviderConfig};
pub use constants::*;
pub use error::{ParleyError, Result};
pub use types::{Conversation, Message, Role};
pub use utils::*;
