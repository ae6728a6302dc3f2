//! News article endpoints. Published articles are public; management is
//! admin-only.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::news_articles;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_news)
        .service(create_news)
        .service(view_news)
        .service(update_news)
        .service(delete_news);
}

#[derive(Deserialize)]
struct NewsQuery {
    #[serde(rename = "includeAll", default)]
    include_all: Option<String>,
}

/// Published articles, newest first. Admins may request drafts too with
/// includeAll=true; for anyone else the flag quietly degrades to the public
/// view.
#[get("/api/news")]
async fn list_news(client: ClientCtx, query: web::Query<NewsQuery>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let include_all = query.include_all.as_deref() == Some("true") && client.is_admin(db).await;

    let mut find = news_articles::Entity::find().order_by_desc(news_articles::Column::PublishedAt);
    if !include_all {
        find = find.filter(news_articles::Column::IsPublished.eq(true));
    }

    let rows = find.all(db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
struct NewsForm {
    title: String,
    summary: Option<String>,
    content: String,
    category: Option<String>,
    #[serde(rename = "coverImage")]
    cover_image: Option<String>,
    #[serde(rename = "isPublished")]
    is_published: Option<bool>,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn validate(form: &NewsForm) -> ApiResult<()> {
    if form.title.trim().is_empty() {
        return Err(ApiError::validation("Please enter a title."));
    }
    if super::html_text_is_empty(&form.content) {
        return Err(ApiError::validation("Please enter content."));
    }
    Ok(())
}

#[post("/api/news")]
async fn create_news(client: ClientCtx, form: web::Json<NewsForm>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let admin_id = client.require_admin(db).await?;

    validate(&form)?;

    let now = Utc::now().naive_utc();
    let article = news_articles::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(form.title.trim().to_string()),
        summary: Set(trimmed(&form.summary)),
        content: Set(form.content.clone()),
        category: Set(trimmed(&form.category)),
        cover_image: Set(trimmed(&form.cover_image)),
        is_published: Set(form.is_published.unwrap_or(true)),
        published_at: Set(now),
        author_id: Set(admin_id),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let article = news_articles::Entity::insert(article)
        .exec_with_returning(db)
        .await?;

    Ok(HttpResponse::Created().json(article))
}

/// Single article. Drafts are only visible to admins.
#[get("/api/news/{id}")]
async fn view_news(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let article = news_articles::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found."))?;

    if !article.is_published && !client.is_admin(db).await {
        return Err(ApiError::not_found("Article not found."));
    }

    Ok(HttpResponse::Ok().json(article))
}

#[put("/api/news/{id}")]
async fn update_news(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<NewsForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    validate(&form)?;

    let article = news_articles::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Article not found."))?;

    let mut active: news_articles::ActiveModel = article.into();
    active.title = Set(form.title.trim().to_string());
    active.summary = Set(trimmed(&form.summary));
    active.content = Set(form.content.clone());
    active.category = Set(trimmed(&form.category));
    active.cover_image = Set(trimmed(&form.cover_image));
    active.is_published = Set(form.is_published.unwrap_or(true));
    active.updated_at = Set(Utc::now().naive_utc());
    let article = sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(article))
}

#[delete("/api/news/{id}")]
async fn delete_news(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let deleted = news_articles::Entity::delete_by_id(path.into_inner())
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(ApiError::not_found("Article not found."));
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
