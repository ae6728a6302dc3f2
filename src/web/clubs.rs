//! Club page content endpoints. Active articles are public, grouped by
//! section; management is admin-only.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::club_articles;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_clubs)
        .service(create_club)
        .service(view_club)
        .service(update_club)
        .service(delete_club);
}

#[derive(Deserialize)]
struct ClubsQuery {
    #[serde(rename = "includeAll", default)]
    include_all: Option<String>,
}

/// Active club articles ordered for display: section, manual order, newest.
#[get("/api/clubs")]
async fn list_clubs(client: ClientCtx, query: web::Query<ClubsQuery>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let include_all = query.include_all.as_deref() == Some("true") && client.is_admin(db).await;

    let mut find = club_articles::Entity::find()
        .order_by_asc(club_articles::Column::Section)
        .order_by_asc(club_articles::Column::DisplayOrder)
        .order_by_desc(club_articles::Column::CreatedAt);
    if !include_all {
        find = find.filter(club_articles::Column::IsActive.eq(true));
    }

    let rows = find.all(db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
struct ClubForm {
    title: String,
    summary: Option<String>,
    content: String,
    section: Option<String>,
    #[serde(rename = "coverImage")]
    cover_image: Option<String>,
    #[serde(rename = "order")]
    display_order: Option<i32>,
    #[serde(rename = "isActive")]
    is_active: Option<bool>,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate(form: &ClubForm) -> ApiResult<()> {
    if form.title.trim().is_empty() {
        return Err(ApiError::validation("Please enter a title."));
    }
    if super::html_text_is_empty(&form.content) {
        return Err(ApiError::validation("Please enter content."));
    }
    Ok(())
}

#[post("/api/clubs")]
async fn create_club(client: ClientCtx, form: web::Json<ClubForm>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let admin_id = client.require_admin(db).await?;

    validate(&form)?;

    let now = Utc::now().naive_utc();
    let article = club_articles::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(form.title.trim().to_string()),
        summary: Set(trimmed(&form.summary)),
        content: Set(form.content.clone()),
        section: Set(trimmed(&form.section).unwrap_or_else(|| "General".to_string())),
        cover_image: Set(trimmed(&form.cover_image)),
        display_order: Set(form.display_order.unwrap_or(0)),
        is_active: Set(form.is_active.unwrap_or(true)),
        author_id: Set(admin_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let article = club_articles::Entity::insert(article)
        .exec_with_returning(db)
        .await?;

    Ok(HttpResponse::Created().json(article))
}

#[get("/api/clubs/{id}")]
async fn view_club(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let article = club_articles::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Club article not found."))?;

    if !article.is_active && !client.is_admin(db).await {
        return Err(ApiError::not_found("Club article not found."));
    }

    Ok(HttpResponse::Ok().json(article))
}

#[put("/api/clubs/{id}")]
async fn update_club(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<ClubForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    validate(&form)?;

    let article = club_articles::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Club article not found."))?;

    let mut active: club_articles::ActiveModel = article.into();
    active.title = Set(form.title.trim().to_string());
    active.summary = Set(trimmed(&form.summary));
    active.content = Set(form.content.clone());
    if let Some(section) = trimmed(&form.section) {
        active.section = Set(section);
    }
    active.cover_image = Set(trimmed(&form.cover_image));
    if let Some(order) = form.display_order {
        active.display_order = Set(order);
    }
    active.is_active = Set(form.is_active.unwrap_or(true));
    active.updated_at = Set(Utc::now().naive_utc());
    let article = sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(article))
}

#[delete("/api/clubs/{id}")]
async fn delete_club(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let deleted = club_articles::Entity::delete_by_id(path.into_inner())
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(ApiError::not_found("Club article not found."));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
