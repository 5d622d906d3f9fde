//! Core types for Powerchip.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod id;
pub mod job;
pub mod price;
pub mod quiz;
pub mod status;

pub use cart::{CartError, CartItem, validate_cart};
pub use id::*;
pub use job::{GenerationKind, JobResult, UnknownGenerationKind};
pub use price::{CurrencyCode, Price};
pub use quiz::{QuizAnswers, QuizMetadata, metadata_keys};
pub use status::*;
