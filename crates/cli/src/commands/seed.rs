//! Seed the database with a development dataset.
//!
//! Creates the default admin account, two stores with linked owner accounts,
//! and a regular user holding one rating on each store. Safe to re-run: if
//! the admin account already exists the command logs and exits without
//! touching anything.

use secrecy::SecretString;
use tracing::info;

use ratebook_core::Email;
use ratebook_server::db::{self, UserRepository};
use ratebook_server::services::RatingService;
use ratebook_server::services::admin::{AdminService, CreateStore, CreateUser};

/// Populate the database with a small working dataset.
///
/// Ratings go through [`RatingService`] so the store aggregates are computed
/// by the same path the API uses, not written by hand.
///
/// # Errors
///
/// Returns an error if the database URL is missing from the environment or
/// any database operation fails. Migrations must have been applied first
/// (`rb-cli migrate`).
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let database_url = std::env::var("RATEBOOK_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| "RATEBOOK_DATABASE_URL not set")?;

    let pool = db::create_pool(&database_url).await?;
    info!("Connected to database");

    let admin_email = Email::parse("admin@example.com")?;
    if UserRepository::new(&pool)
        .get_by_email(&admin_email)
        .await?
        .is_some()
    {
        info!("Database already seeded, nothing to do");
        return Ok(());
    }

    let admin = AdminService::new(&pool);

    info!("Creating admin account...");
    admin
        .create_user(&CreateUser {
            name: "System Administrator Account",
            email: "admin@example.com",
            password: "Admin@123",
            address: "123 Admin Street, Admin City, AdminState 12345",
            role: "admin",
            store_id: None,
        })
        .await?;

    info!("Creating sample stores...");
    let electronics = admin
        .create_store(&CreateStore {
            name: "Awesome Electronics Store Location",
            email: "electronics@store.com",
            address: "456 Market Street, Tech City, State 54321",
        })
        .await?;

    let fashion = admin
        .create_store(&CreateStore {
            name: "Premium Fashion Boutique Shop",
            email: "fashion@boutique.com",
            address: "789 Fashion Avenue, Style City, State 67890",
        })
        .await?;

    info!("Creating store owners...");
    admin
        .create_user(&CreateUser {
            name: "Store Owner Electronics",
            email: "owner1@example.com",
            password: "Owner@123",
            address: "456 Market Street, Tech City, State 54321",
            role: "owner",
            store_id: Some(electronics.id.as_i64()),
        })
        .await?;

    admin
        .create_user(&CreateUser {
            name: "Store Owner Fashion Boutique",
            email: "owner2@example.com",
            password: "Owner@123",
            address: "789 Fashion Avenue, Style City, State 67890",
            role: "owner",
            store_id: Some(fashion.id.as_i64()),
        })
        .await?;

    info!("Creating sample user...");
    let user = admin
        .create_user(&CreateUser {
            name: "Regular User Test Account",
            email: "user@example.com",
            password: "User@123",
            address: "321 User Lane, Customer City, State 11111",
            role: "user",
            store_id: None,
        })
        .await?;

    info!("Submitting sample ratings...");
    let ratings = RatingService::new(&pool);
    ratings.submit(&user, electronics.id, 5).await?;
    ratings.submit(&user, fashion.id, 4).await?;

    info!("Seeding complete!");
    info!("Default credentials:");
    info!("  Admin: admin@example.com / Admin@123");
    info!("  Owner1: owner1@example.com / Owner@123");
    info!("  Owner2: owner2@example.com / Owner@123");
    info!("  User: user@example.com / User@123");

    Ok(())
}
