//! SeaORM Entity for posts table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Board category enum matching PostgreSQL post_category
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "post_category")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Category {
    #[sea_orm(string_value = "FREE")]
    Free,
    #[sea_orm(string_value = "CONSULTATION")]
    Consultation,
    #[sea_orm(string_value = "STUDY")]
    Study,
    #[sea_orm(string_value = "LOST_FOUND")]
    LostFound,
    #[sea_orm(string_value = "INFO")]
    Info,
    #[sea_orm(string_value = "QNA")]
    Qna,
    #[sea_orm(string_value = "ANNOUNCEMENT")]
    Announcement,
    #[sea_orm(string_value = "CLUB")]
    Club,
}

impl Category {
    /// Parse a category from a query/body value. Case-insensitive, matching
    /// how clients send both "qna" and "QNA".
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_uppercase().as_str() {
            "FREE" => Some(Category::Free),
            "CONSULTATION" => Some(Category::Consultation),
            "STUDY" => Some(Category::Study),
            "LOST_FOUND" => Some(Category::LostFound),
            "INFO" => Some(Category::Info),
            "QNA" => Some(Category::Qna),
            "ANNOUNCEMENT" => Some(Category::Announcement),
            "CLUB" => Some(Category::Club),
            _ => None,
        }
    }
}

/// Author disclosure choice for a post or comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "visibility_name")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[sea_orm(string_value = "nickname")]
    Nickname,
    #[sea_orm(string_value = "anonymous")]
    Anonymous,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    /// Rich HTML from the client-side editor
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub category: Category,
    /// External identity id of the author. Never reassigned.
    pub author_id: String,
    pub visibility_name: Visibility,
    pub is_deleted: bool,
    pub is_hidden: bool,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::ExternalId",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Author,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_many = "super::likes::Entity")]
    Likes,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Author.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl Related<super::likes::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Likes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
