//! Ratebook Core - Shared domain types library.
//!
//! This crate provides common types used across all Ratebook components:
//! - `server` - HTTP API for store ratings and administration
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access, no HTTP
//! handlers. Every value that crosses a trust boundary (request payloads,
//! database rows) is parsed into one of these types before the rest of the
//! system touches it.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, validated text fields,
//!   roles, and rating values

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
