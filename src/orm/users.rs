//! SeaORM Entity for users table

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Role enum matching PostgreSQL user_role
///
/// Assigned at first identity sync from the school email-domain allow-list
/// (STUDENT or VISITOR); changed afterwards only by explicit admin action.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "user_role")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    #[sea_orm(string_value = "STUDENT")]
    Student,
    #[sea_orm(string_value = "PARENT")]
    Parent,
    #[sea_orm(string_value = "STAFF")]
    Staff,
    #[sea_orm(string_value = "TEACHER")]
    Teacher,
    #[sea_orm(string_value = "VISITOR")]
    Visitor,
    #[sea_orm(string_value = "ADMIN")]
    Admin,
}

impl Role {
    /// Parse a role from its wire value. Case-sensitive, like the enum column.
    pub fn from_str_value(value: &str) -> Option<Self> {
        match value {
            "STUDENT" => Some(Role::Student),
            "PARENT" => Some(Role::Parent),
            "STAFF" => Some(Role::Staff),
            "TEACHER" => Some(Role::Teacher),
            "VISITOR" => Some(Role::Visitor),
            "ADMIN" => Some(Role::Admin),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// Identity id from the external auth provider. Exactly one row per id.
    #[sea_orm(unique)]
    pub external_id: String,
    pub email: Option<String>,
    pub name: Option<String>,
    pub nickname: Option<String>,
    pub role: Role,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::posts::Entity")]
    Posts,
    #[sea_orm(has_many = "super::comments::Entity")]
    Comments,
    #[sea_orm(has_one = "super::teachers::Entity")]
    Teacher,
}

impl Related<super::posts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Posts.def()
    }
}

impl Related<super::comments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
