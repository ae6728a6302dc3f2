//! Comment endpoints: list and create under a post, soft-delete by id.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::comments::{self, Visibility};
use crate::orm::posts;
use crate::visibility;
use actix_web::{delete, get, post, web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::ActiveValue::Set;
use sea_orm::EntityTrait;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_comments)
        .service(create_comment)
        .service(delete_comment);
}

#[derive(Serialize)]
struct CommentResponse {
    id: String,
    #[serde(rename = "postId")]
    post_id: String,
    content: String,
    #[serde(rename = "visibilityName")]
    visibility_name: Visibility,
    #[serde(rename = "authorId")]
    author_id: String,
    author: AuthorView,
    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
}

#[derive(Serialize)]
struct AuthorView {
    #[serde(rename = "displayName")]
    display_name: String,
}

/// List visible comments for a post, oldest first.
#[get("/api/posts/{id}/comments")]
async fn list_comments(path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let post_id = path.into_inner();

    let rows = super::posts::visible_comments(db, &post_id).await?;

    let comments: Vec<CommentResponse> = rows
        .into_iter()
        .map(|(comment, author)| CommentResponse {
            author: AuthorView {
                display_name: visibility::display_name(
                    comment.visibility_name,
                    author.as_ref().and_then(|a| a.nickname.as_deref()),
                    author.as_ref().and_then(|a| a.name.as_deref()),
                ),
            },
            author_id: comment.author_id,
            id: comment.id,
            post_id: comment.post_id,
            content: comment.content,
            visibility_name: comment.visibility_name,
            created_at: comment.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(comments))
}

#[derive(Deserialize)]
struct NewCommentForm {
    content: String,
    #[serde(rename = "visibilityName")]
    visibility_name: Option<String>,
}

/// Create a comment on a visible post. The post's comment count is derived
/// from comment rows, so no counter update happens here.
#[post("/api/posts/{id}/comments")]
async fn create_comment(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<NewCommentForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();

    if form.content.trim().is_empty() {
        return Err(ApiError::validation("Please enter a comment."));
    }

    let post_id = path.into_inner();
    let post = posts::Entity::find_by_id(post_id.clone()).one(db).await?;

    match post {
        Some(p) if !p.is_deleted && !p.is_hidden => {}
        _ => return Err(ApiError::not_found("Post not found.")),
    }

    let visibility_name = match form.visibility_name.as_deref() {
        None | Some("") | Some("nickname") => Visibility::Nickname,
        Some("anonymous") => Visibility::Anonymous,
        Some(other) => {
            return Err(ApiError::validation(format!(
                "Unknown visibility mode: {}",
                other
            )))
        }
    };

    let user = super::users::ensure_user(db, &identity).await?;

    let now = Utc::now().naive_utc();
    let comment = comments::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        post_id: Set(post_id),
        author_id: Set(user.external_id.clone()),
        content: Set(form.content.trim().to_string()),
        visibility_name: Set(visibility_name),
        is_deleted: Set(false),
        is_hidden: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let comment = comments::Entity::insert(comment)
        .exec_with_returning(db)
        .await?;

    Ok(HttpResponse::Created().json(CommentResponse {
        author: AuthorView {
            display_name: visibility::display_name(
                comment.visibility_name,
                user.nickname.as_deref(),
                user.name.as_deref(),
            ),
        },
        author_id: comment.author_id,
        id: comment.id,
        post_id: comment.post_id,
        content: comment.content,
        visibility_name: comment.visibility_name,
        created_at: comment.created_at,
    }))
}

/// Soft-delete a comment. Author or admin. The parent post's comment count is
/// derived, so flagging the row is the whole mutation.
#[delete("/api/comments/{id}")]
async fn delete_comment(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let viewer_id = client.require_login()?;

    let comment = comments::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?;

    let comment = match comment {
        Some(c) if !c.is_deleted => c,
        _ => return Err(ApiError::not_found("Comment not found.")),
    };

    let viewer_is_admin = client.is_admin(db).await;
    if !visibility::can_delete(&comment.author_id, Some(viewer_id), viewer_is_admin) {
        return Err(ApiError::forbidden(
            "You do not have permission to delete this comment.",
        ));
    }

    let mut active: comments::ActiveModel = comment.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now().naive_utc());
    sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
