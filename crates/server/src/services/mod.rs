//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login, sessions, password rotation
//! - `ratings` - Rating submission and revision
//! - `directory` - Store browsing and the owner view
//! - `admin` - Account/store management and the platform dashboard
//!
//! Services own the data rules; who may reach each operation is decided by
//! the route-layer extractors in [`crate::middleware`].

mod error;

pub mod admin;
pub mod auth;
pub mod directory;
pub mod ratings;

pub use admin::AdminService;
pub use auth::AuthService;
pub use directory::DirectoryService;
pub use error::ServiceError;
pub use ratings::RatingService;
