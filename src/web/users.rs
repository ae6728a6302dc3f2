//! Current-user endpoints and the user-row sync fallback.
//!
//! The identity webhook is the normal path for creating user rows; these
//! endpoints cover the gap when a fresh account acts before the webhook
//! lands.

use crate::app_config;
use crate::db::get_db_pool;
use crate::error::ApiResult;
use crate::identity::Identity;
use crate::middleware::ClientCtx;
use crate::orm::users;
use crate::role;
use actix_web::{get, post, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, SqlErr};
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(me).service(sync_user);
}

/// Fetch the user row for an identity, creating it when the webhook has not
/// synced it yet. First creation assigns the role from the school-domain
/// rule; an existing row is returned untouched.
pub async fn ensure_user(db: &DatabaseConnection, identity: &Identity) -> ApiResult<users::Model> {
    if let Some(user) = users::Entity::find()
        .filter(users::Column::ExternalId.eq(identity.external_id.clone()))
        .one(db)
        .await?
    {
        return Ok(user);
    }

    let domains = app_config::school_email_domains();
    let now = Utc::now().naive_utc();
    let new_user = users::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        external_id: Set(identity.external_id.clone()),
        email: Set(identity.email.clone()),
        name: Set(None),
        nickname: Set(None),
        role: Set(role::initial_role_for_email(identity.email.as_deref(), &domains)),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match users::Entity::insert(new_user).exec_with_returning(db).await {
        Ok(user) => Ok(user),
        // Concurrent request (or the webhook) created the row first.
        Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
            Ok(users::Entity::find()
                .filter(users::Column::ExternalId.eq(identity.external_id.clone()))
                .one(db)
                .await?
                .ok_or(crate::error::ApiError::Internal)?)
        }
        Err(err) => Err(err.into()),
    }
}

/// Who am I: identity id, stored role, email, display name.
#[get("/api/users/me")]
async fn me(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let user_id = client.require_login()?;

    let role = client.role(db).await;
    let user = users::Entity::find()
        .filter(users::Column::ExternalId.eq(user_id))
        .one(db)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "userId": user_id,
        "role": role,
        "email": client.get_email(),
        "name": user.and_then(|u| u.name),
    })))
}

/// Sync the caller's identity into the users table. Creates the row with the
/// school-domain role rule; updates email/name on an existing row but never
/// the role.
#[post("/api/users/sync")]
async fn sync_user(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();

    let user = ensure_user(db, &identity).await?;

    // Refresh contact fields from the identity claims; role is left alone.
    let mut active: users::ActiveModel = user.into();
    if let Some(email) = &identity.email {
        active.email = Set(Some(email.clone()));
    }
    active.updated_at = Set(Utc::now().naive_utc());
    let user = sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "message": "User synced to the database.",
        "user": user,
    })))
}
