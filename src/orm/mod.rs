//! SeaORM entities, one module per table.

pub mod admin_actions;
pub mod club_articles;
pub mod comments;
pub mod likes;
pub mod news_articles;
pub mod posts;
pub mod reports;
pub mod suggestions;
pub mod teachers;
pub mod users;
