//! # Maple Library
//!
//! This library exposes the Maple modules for testing and integration.
//!
//! The main binary uses these modules through the `main.rs` entry point.

pub mod api;
pub mod backend;
pub mod cli;
pub mod config;

// Re-export maple_core for convenience
pub use maple_core;
