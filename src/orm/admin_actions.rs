//! SeaORM Entity for admin_actions table
//!
//! Append-only audit trail of moderation actions. Rows are never updated or
//! deleted. DISMISS is a report-status transition only and is not logged here.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logged action kinds matching PostgreSQL admin_action_type
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "admin_action_type")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminActionType {
    #[sea_orm(string_value = "HIDE")]
    Hide,
    #[sea_orm(string_value = "DELETE")]
    Delete,
    #[sea_orm(string_value = "WARNING")]
    Warning,
    #[sea_orm(string_value = "SUSPEND")]
    Suspend,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "admin_actions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub report_id: String,
    /// External identity id of the acting admin
    pub admin_id: String,
    pub action_type: AdminActionType,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    pub created_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::reports::Entity",
        from = "Column::ReportId",
        to = "super::reports::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Report,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::AdminId",
        to = "super::users::Column::ExternalId"
    )]
    Admin,
}

impl Related<super::reports::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Report.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
