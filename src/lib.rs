#![deny(missing_docs)]
//! Oxide Search Bot library.
//!
//! Telegram bot answering `/search` and `/img` with Google Custom Search results.

/// Command handling and Telegram transport.
pub mod bot;
/// Configuration management.
pub mod config;
/// Logging setup.
pub mod logging;
/// Search and image clients.
pub mod search;
/// Utility functions.
pub mod utils;
