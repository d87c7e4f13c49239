//! Domain models for the rating platform.
//!
//! These types represent validated domain objects separate from database row
//! types. Rows are parsed into them on the way out of the repository layer;
//! anything that fails to parse surfaces as data corruption there.

pub mod rating;
pub mod store;
pub mod token;
pub mod user;

pub use rating::{Rating, RatingWithRater};
pub use store::{OwnRating, OwnedStoreSummary, Store, StoreListing};
pub use token::AuthToken;
pub use user::{User, UserWithStore};
