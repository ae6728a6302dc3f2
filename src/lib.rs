pub mod app_config;
pub mod db;
pub mod error;
pub mod hot;
pub mod identity;
pub mod middleware;
pub mod moderation;
pub mod orm;
pub mod role;
pub mod visibility;
pub mod web;

pub use middleware::ClientCtx;
