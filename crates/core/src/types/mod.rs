//! Core types for Ratebook.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod password;
pub mod rating;
pub mod role;
pub mod text;

pub use email::{Email, EmailError};
pub use id::*;
pub use password::{Password, PasswordError};
pub use rating::{AverageRating, RatingValue, RatingValueError};
pub use role::{Role, RolePolicy};
pub use text::{Address, PersonName, StoreName, TextError};
