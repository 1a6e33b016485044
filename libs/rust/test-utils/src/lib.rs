//! Shared test utilities for the session platform Rust services.
//!
//! This crate provides:
//! - Proptest generators for tokens, request identifiers and headers
//! - Test fixtures with sample whitelist data

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
