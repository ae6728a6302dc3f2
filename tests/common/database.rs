//! Test database setup and management
#![allow(dead_code)]

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};
use std::env;

/// Connect to the test database named by TEST_DATABASE_URL.
///
/// Returns None when the variable is unset or the database is unreachable so
/// the integration suite skips cleanly on machines without Postgres. The
/// schema from database/schema.sql must already be applied.
pub async fn setup_test_database() -> Option<DatabaseConnection> {
    let database_url = match env::var("TEST_DATABASE_URL") {
        Ok(url) => url,
        Err(_) => {
            eprintln!("skipping: TEST_DATABASE_URL is not set");
            return None;
        }
    };

    match Database::connect(&database_url).await {
        Ok(db) => Some(db),
        Err(err) => {
            eprintln!("skipping: test database unreachable: {}", err);
            None
        }
    }
}

/// Cleanup function to remove test data
///
/// Truncates all tables that might contain test data. Child tables are listed
/// first to avoid foreign key constraint violations; CASCADE covers the rest.
pub async fn cleanup_test_data(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "TRUNCATE TABLE
            admin_actions,
            reports,
            likes,
            comments,
            posts,
            teachers,
            news_articles,
            club_articles,
            suggestions,
            users
        RESTART IDENTITY CASCADE;"
            .to_string(),
    ))
    .await?;

    Ok(())
}
