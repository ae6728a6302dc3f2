//! SeaORM Entity for club_articles table

use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "club_articles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub title: String,
    pub summary: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    /// Display grouping on the clubs page (e.g. "Sports", "Music")
    pub section: String,
    pub cover_image: Option<String>,
    /// Manual ordering within a section
    pub display_order: i32,
    pub is_active: bool,
    /// External identity id of the authoring admin/staff
    pub author_id: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AuthorId",
        to = "super::users::Column::ExternalId"
    )]
    Author,
}

impl ActiveModelBehavior for ActiveModel {}
