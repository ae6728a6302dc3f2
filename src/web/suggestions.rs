//! Suggestion box: any authenticated user submits; only admins read.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::suggestions;
use actix_web::{get, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{EntityTrait, QueryOrder};
use serde::Deserialize;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(submit_suggestion).service(list_suggestions);
}

#[derive(Deserialize)]
struct SuggestionForm {
    name: Option<String>,
    title: String,
    content: String,
}

#[post("/api/suggestions")]
async fn submit_suggestion(
    client: ClientCtx,
    form: web::Json<SuggestionForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();
    let author_id = identity.external_id.clone();

    if form.title.trim().is_empty() {
        return Err(ApiError::validation("Please enter a title."));
    }
    if form.content.trim().is_empty() {
        return Err(ApiError::validation("Please enter content."));
    }

    super::users::ensure_user(db, &identity).await?;

    let suggestion = suggestions::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        name: Set(form
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)),
        title: Set(form.title.trim().to_string()),
        content: Set(form.content.trim().to_string()),
        author_id: Set(Some(author_id)),
        created_at: Set(Utc::now().naive_utc()),
    };
    let suggestion = suggestions::Entity::insert(suggestion)
        .exec_with_returning(db)
        .await?;

    Ok(HttpResponse::Created().json(suggestion))
}

/// The whole inbox, newest first. ADMIN only.
#[get("/api/suggestions")]
async fn list_suggestions(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let rows = suggestions::Entity::find()
        .order_by_desc(suggestions::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}
