//! Test fixtures for creating test data
#![allow(dead_code)]

use chrono::Utc;
use hallways::orm::posts::{self, Category, Visibility};
use hallways::orm::users::{self, Role};
use hallways::orm::{comments, likes};
use sea_orm::ActiveValue::Set;
use sea_orm::{DatabaseConnection, DbErr, EntityTrait};
use uuid::Uuid;

/// Create a test user with a given external identity id and role.
pub async fn create_test_user(
    db: &DatabaseConnection,
    external_id: &str,
    email: Option<&str>,
    role: Role,
) -> Result<users::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        external_id: Set(external_id.to_string()),
        email: Set(email.map(str::to_string)),
        name: Set(Some(format!("Test {}", external_id))),
        nickname: Set(None),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
    };
    users::Entity::insert(user).exec_with_returning(db).await
}

/// Create a visible test post owned by `author_id`.
pub async fn create_test_post(
    db: &DatabaseConnection,
    author_id: &str,
    category: Category,
    title: &str,
) -> Result<posts::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let post = posts::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(title.to_string()),
        content: Set(format!("<p>{}</p>", title)),
        category: Set(category),
        author_id: Set(author_id.to_string()),
        visibility_name: Set(Visibility::Nickname),
        is_deleted: Set(false),
        is_hidden: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    posts::Entity::insert(post).exec_with_returning(db).await
}

/// Create a visible test comment on `post_id`.
pub async fn create_test_comment(
    db: &DatabaseConnection,
    post_id: &str,
    author_id: &str,
    content: &str,
) -> Result<comments::Model, DbErr> {
    let now = Utc::now().naive_utc();
    let comment = comments::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        post_id: Set(post_id.to_string()),
        author_id: Set(author_id.to_string()),
        content: Set(content.to_string()),
        visibility_name: Set(Visibility::Nickname),
        is_deleted: Set(false),
        is_hidden: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    comments::Entity::insert(comment).exec_with_returning(db).await
}

/// Insert a like row directly.
pub async fn create_test_like(
    db: &DatabaseConnection,
    post_id: &str,
    user_id: &str,
) -> Result<likes::Model, DbErr> {
    let like = likes::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        post_id: Set(post_id.to_string()),
        user_id: Set(user_id.to_string()),
        created_at: Set(Utc::now().naive_utc()),
    };
    likes::Entity::insert(like).exec_with_returning(db).await
}
