//! Like toggle and status.
//!
//! A like is the presence of a (post_id, user_id) row; the pair is UNIQUE in
//! the database and counts are derived from the rows. Two racing toggles
//! cannot drift a counter: the loser of an insert race just learns the like
//! already exists.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::{likes, posts};
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, SqlErr};
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(toggle_like).service(like_status);
}

/// Toggle the caller's like on a post.
#[post("/api/posts/{id}/like")]
async fn toggle_like(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();
    let viewer_id = identity.external_id.clone();
    let post_id = path.into_inner();

    let post = posts::Entity::find_by_id(post_id.clone()).one(db).await?;
    match post {
        Some(p) if !p.is_deleted && !p.is_hidden => {}
        _ => return Err(ApiError::not_found("Post not found.")),
    }

    super::users::ensure_user(db, &identity).await?;

    let existing = likes::Entity::find()
        .filter(likes::Column::PostId.eq(post_id.clone()))
        .filter(likes::Column::UserId.eq(viewer_id.clone()))
        .one(db)
        .await?;

    if let Some(like) = existing {
        likes::Entity::delete_by_id(like.id).exec(db).await?;
        return Ok(HttpResponse::Ok().json(json!({ "liked": false })));
    }

    let like = likes::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        post_id: Set(post_id),
        user_id: Set(viewer_id),
        created_at: Set(Utc::now().naive_utc()),
    };

    match likes::Entity::insert(like).exec(db).await {
        Ok(_) => Ok(HttpResponse::Ok().json(json!({ "liked": true }))),
        // A concurrent toggle inserted first; the like exists, which is what
        // the caller asked for.
        Err(err)
            if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) =>
        {
            Ok(HttpResponse::Ok().json(json!({ "liked": true })))
        }
        Err(err) => Err(err.into()),
    }
}

/// Whether the caller has liked the post. Guests are simply "not liked".
#[get("/api/posts/{id}/like")]
async fn like_status(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let Some(viewer_id) = client.get_id() else {
        return Ok(HttpResponse::Ok().json(json!({ "liked": false })));
    };

    let liked = likes::Entity::find()
        .filter(likes::Column::PostId.eq(path.into_inner()))
        .filter(likes::Column::UserId.eq(viewer_id))
        .one(db)
        .await?
        .is_some();

    Ok(HttpResponse::Ok().json(json!({ "liked": liked })))
}
