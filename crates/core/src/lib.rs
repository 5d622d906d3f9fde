//! Powerchip Core - Shared types library.
//!
//! This crate provides common types used across all Powerchip components:
//! - `storefront` - Checkout, webhook and scheduled post generation backend
//! - `cli` - Command-line tools for operators
//!
//! # Architecture
//!
//! The core crate contains only types and pure conversions - no I/O, no HTTP
//! clients, no process spawning. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Cart items, quiz answers, prices, session ids, statuses and
//!   generation job kinds

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
