//! SeaORM Entity for reports table
//!
//! A report targets exactly one of post_id/comment_id. At most one PENDING
//! report may exist per (reporter, target); repeat reports from the same
//! reporter merge into it (report_count increments, reason is overwritten)
//! until an admin action moves the report out of PENDING.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Report lifecycle enum matching PostgreSQL report_status
///
/// PENDING is the only state further reports merge into. RESOLVED and
/// DISMISSED are terminal. REVIEWED (reached via WARNING) is not terminal;
/// a later action overwrites it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "report_status")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReportStatus {
    #[sea_orm(string_value = "PENDING")]
    Pending,
    #[sea_orm(string_value = "REVIEWED")]
    Reviewed,
    #[sea_orm(string_value = "RESOLVED")]
    Resolved,
    #[sea_orm(string_value = "DISMISSED")]
    Dismissed,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// External identity id of the reporter
    pub reporter_id: String,
    pub post_id: Option<String>,
    pub comment_id: Option<String>,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub report_count: i32,
    pub status: ReportStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ReporterId",
        to = "super::users::Column::ExternalId"
    )]
    Reporter,
    #[sea_orm(
        belongs_to = "super::posts::Entity",
        from = "Column::PostId",
        to = "super::posts::Column::Id"
    )]
    Post,
    #[sea_orm(
        belongs_to = "super::comments::Entity",
        from = "Column::CommentId",
        to = "super::comments::Column::Id"
    )]
    Comment,
    #[sea_orm(has_many = "super::admin_actions::Entity")]
    AdminActions,
}

impl Related<super::admin_actions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AdminActions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
