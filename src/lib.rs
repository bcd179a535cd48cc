//! clipgif - video clip to GIF conversion within platform limits
//!
//! This library crate exposes the core functionality for integration testing.

pub mod config;
pub mod conversion;
