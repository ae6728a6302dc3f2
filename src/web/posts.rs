//! Community post endpoints: listing (with hot ranking), creation, detail,
//! edit, and soft-delete.

use crate::app_config;
use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::hot;
use crate::middleware::ClientCtx;
use crate::orm::posts::{self, Category, Visibility};
use crate::orm::{comments, users};
use crate::visibility;
use actix_web::{delete, get, post, put, web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_posts)
        .service(create_post)
        .service(view_post)
        .service(update_post)
        .service(delete_post);
}

/// A post row joined with its author columns and derived engagement counts.
/// Counts come from COUNT subqueries so they can never drift from the live
/// like/comment rows.
#[derive(Debug, FromQueryResult)]
pub struct PostForView {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub author_id: String,
    pub visibility_name: Visibility,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
    pub like_count: i64,
    pub comment_count: i64,
    pub author_nickname: Option<String>,
    pub author_name: Option<String>,
}

/// Base select for visible posts, with author join and count columns.
pub fn find_visible_posts() -> sea_orm::Select<posts::Entity> {
    posts::Entity::find()
        .filter(posts::Column::IsDeleted.eq(false))
        .filter(posts::Column::IsHidden.eq(false))
        .join(JoinType::LeftJoin, posts::Relation::Author.def())
        .column_as(users::Column::Nickname, "author_nickname")
        .column_as(users::Column::Name, "author_name")
        .column_as(
            Expr::cust("(SELECT COUNT(*) FROM likes WHERE likes.post_id = posts.id)"),
            "like_count",
        )
        .column_as(
            Expr::cust(
                "(SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id \
                 AND comments.is_deleted = FALSE AND comments.is_hidden = FALSE)",
            ),
            "comment_count",
        )
}

#[derive(Serialize)]
struct AuthorView {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Serialize)]
struct PostView {
    id: String,
    title: String,
    content: String,
    category: Category,
    #[serde(rename = "visibilityName")]
    visibility_name: Visibility,
    /// Omitted entirely for Q&A rows the viewer does not own.
    #[serde(rename = "authorId", skip_serializing_if = "Option::is_none")]
    author_id: Option<String>,
    author: AuthorView,
    #[serde(rename = "likeCount")]
    like_count: i64,
    #[serde(rename = "commentCount")]
    comment_count: i64,
    #[serde(rename = "createdAt")]
    created_at: NaiveDateTime,
    #[serde(rename = "updatedAt")]
    updated_at: NaiveDateTime,
}

impl PostView {
    fn render(post: PostForView, viewer_id: Option<&str>, viewer_is_admin: bool) -> Self {
        let display_name = visibility::author_display_name(
            post.category,
            post.visibility_name,
            &post.author_id,
            post.author_nickname.as_deref(),
            post.author_name.as_deref(),
            viewer_id,
            viewer_is_admin,
        );

        let disclose_author = post.category != Category::Qna
            || visibility::is_owner_or_admin(&post.author_id, viewer_id, viewer_is_admin);

        PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            category: post.category,
            visibility_name: post.visibility_name,
            author_id: disclose_author.then_some(post.author_id),
            author: AuthorView { display_name },
            like_count: post.like_count,
            comment_count: post.comment_count,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize)]
struct Pagination {
    page: u64,
    limit: u64,
    total: u64,
    #[serde(rename = "totalPages")]
    total_pages: u64,
}

#[derive(Serialize)]
struct PostListResponse {
    posts: Vec<PostView>,
    pagination: Pagination,
}

/// Parsed list query. The excludeCategory key repeats, so the raw pair list
/// is parsed by hand instead of through a derive.
struct ListQuery {
    category: Option<String>,
    exclude: Vec<Category>,
    mine: bool,
    hot: bool,
    page: u64,
    limit: u64,
}

impl ListQuery {
    fn from_pairs(pairs: &[(String, String)]) -> ApiResult<Self> {
        let limits = app_config::limits();
        let mut query = ListQuery {
            category: None,
            exclude: Vec::new(),
            mine: false,
            hot: false,
            page: 1,
            limit: limits.page_size,
        };

        for (key, value) in pairs {
            match key.as_str() {
                "category" => query.category = Some(value.clone()),
                "excludeCategory" => {
                    let cat = Category::parse(value).ok_or_else(|| {
                        ApiError::validation(format!("Unknown category: {}", value))
                    })?;
                    query.exclude.push(cat);
                }
                "mine" => query.mine = value == "true",
                "hot" => query.hot = value == "true",
                "page" => query.page = value.parse().unwrap_or(1).max(1),
                "limit" => {
                    query.limit = value
                        .parse()
                        .unwrap_or(limits.page_size)
                        .clamp(1, limits.max_page_size)
                }
                _ => {}
            }
        }

        Ok(query)
    }
}

fn empty_page(query: &ListQuery) -> PostListResponse {
    PostListResponse {
        posts: Vec::new(),
        pagination: Pagination {
            page: query.page,
            limit: query.limit,
            total: 0,
            total_pages: 0,
        },
    }
}

/// List posts, viewer-filtered and optionally hot-ranked.
#[get("/api/posts")]
async fn list_posts(
    client: ClientCtx,
    raw_query: web::Query<Vec<(String, String)>>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let query = ListQuery::from_pairs(&raw_query)?;

    let viewer_id = client.get_id().map(str::to_string);
    let viewer_is_admin = client.is_admin(db).await;

    let mut condition = Condition::all();

    match query.category.as_deref() {
        Some(raw) if raw != "all" => {
            let category = Category::parse(raw)
                .ok_or_else(|| ApiError::validation(format!("Unknown category: {}", raw)))?;
            condition = condition.add(posts::Column::Category.eq(category));

            if category == Category::Qna {
                // Q&A lists are empty for guests rather than an error; detail
                // access is checked separately.
                let Some(viewer) = viewer_id.clone() else {
                    return Ok(HttpResponse::Ok().json(empty_page(&query)));
                };
                if query.mine {
                    condition = condition.add(posts::Column::AuthorId.eq(viewer));
                }
            }
        }
        _ => {
            // The general feed never includes Q&A or club posts, on top of
            // any client-requested exclusions.
            let mut excluded = query.exclude.clone();
            for cat in visibility::GENERAL_FEED_EXCLUDED {
                if !excluded.contains(&cat) {
                    excluded.push(cat);
                }
            }
            condition = condition.add(posts::Column::Category.is_not_in(excluded));
        }
    }

    if query.hot {
        // The hot feed never includes Q&A or club posts.
        condition = condition.add(
            posts::Column::Category.is_not_in(visibility::GENERAL_FEED_EXCLUDED.to_vec()),
        );
    }

    let base = find_visible_posts().filter(condition);
    let skip = (query.page - 1) * query.limit;

    let (rows, total) = if query.hot {
        // Scored in memory: the score depends on "now", so the ranking cannot
        // be pushed into the query.
        let mut all = base.into_model::<PostForView>().all(db).await?;
        let total = all.len() as u64;

        let now = Utc::now().naive_utc();
        hot::sort_by_hot_score(&mut all, now, |p| {
            (p.like_count, p.comment_count, p.created_at)
        });

        let page: Vec<PostForView> = all
            .into_iter()
            .skip(skip as usize)
            .take(query.limit as usize)
            .collect();
        (page, total)
    } else {
        let total = base.clone().count(db).await?;

        let rows = base
            .order_by_desc(posts::Column::CreatedAt)
            .offset(skip)
            .limit(query.limit)
            .into_model::<PostForView>()
            .all(db)
            .await?;
        (rows, total)
    };

    let posts = rows
        .into_iter()
        .map(|p| PostView::render(p, viewer_id.as_deref(), viewer_is_admin))
        .collect();

    Ok(HttpResponse::Ok().json(PostListResponse {
        posts,
        pagination: Pagination {
            page: query.page,
            limit: query.limit,
            total,
            total_pages: total.div_ceil(query.limit),
        },
    }))
}

#[derive(Deserialize)]
struct NewPostForm {
    title: String,
    content: String,
    category: Option<String>,
    #[serde(rename = "visibilityName")]
    visibility_name: Option<String>,
}

fn parse_visibility(value: Option<&str>) -> ApiResult<Visibility> {
    match value {
        None | Some("nickname") => Ok(Visibility::Nickname),
        Some("anonymous") => Ok(Visibility::Anonymous),
        Some(other) => Err(ApiError::validation(format!(
            "Unknown visibility mode: {}",
            other
        ))),
    }
}

fn validate_title_and_content(title: &str, content: &str) -> ApiResult<()> {
    if title.trim().is_empty() {
        return Err(ApiError::validation("Please enter a title."));
    }
    if super::html_text_is_empty(content) {
        return Err(ApiError::validation("Please enter content."));
    }
    if content.len() > app_config::limits().max_content_length {
        return Err(ApiError::validation("Content is too long."));
    }
    Ok(())
}

/// Create a post owned by the caller. Category defaults to FREE.
#[post("/api/posts")]
async fn create_post(client: ClientCtx, form: web::Json<NewPostForm>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();
    client.require_student_access(db).await?;

    validate_title_and_content(&form.title, &form.content)?;

    let category = match form.category.as_deref() {
        None | Some("") => Category::Free,
        Some(raw) => Category::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown category: {}", raw)))?,
    };
    let visibility_name = parse_visibility(form.visibility_name.as_deref())?;

    // The identity webhook may not have fired yet for a fresh account.
    let user = super::users::ensure_user(db, &identity).await?;

    let now = Utc::now().naive_utc();
    let post = posts::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        title: Set(form.title.trim().to_string()),
        content: Set(form.content.clone()),
        category: Set(category),
        author_id: Set(user.external_id.clone()),
        visibility_name: Set(visibility_name),
        is_deleted: Set(false),
        is_hidden: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let post = posts::Entity::insert(post).exec_with_returning(db).await?;

    let view = PostForView {
        id: post.id,
        title: post.title,
        content: post.content,
        category: post.category,
        author_id: post.author_id,
        visibility_name: post.visibility_name,
        created_at: post.created_at,
        updated_at: post.updated_at,
        like_count: 0,
        comment_count: 0,
        author_nickname: user.nickname,
        author_name: user.name,
    };

    Ok(HttpResponse::Created().json(PostView::render(view, client.get_id(), false)))
}

#[derive(Serialize)]
struct CommentView {
    id: String,
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
struct PostDetailResponse {
    #[serde(flatten)]
    post: PostView,
    comments: Vec<CommentView>,
}

/// Fetch a visible comment list for a post, author names resolved.
pub(super) async fn visible_comments(
    db: &DatabaseConnection,
    post_id: &str,
) -> ApiResult<Vec<(comments::Model, Option<users::Model>)>> {
    Ok(comments::Entity::find()
        .filter(comments::Column::PostId.eq(post_id))
        .filter(comments::Column::IsDeleted.eq(false))
        .filter(comments::Column::IsHidden.eq(false))
        .order_by_asc(comments::Column::CreatedAt)
        .find_also_related(users::Entity)
        .all(db)
        .await?)
}

/// Post detail with comments. Q&A items are only served to the author and
/// admins; everyone else gets Forbidden even on a direct fetch.
#[get("/api/posts/{id}")]
async fn view_post(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let post_id = path.into_inner();

    let viewer_id = client.get_id().map(str::to_string);
    let viewer_is_admin = client.is_admin(db).await;

    let post = posts::Entity::find_by_id(post_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    if post.category == Category::Qna
        && !visibility::can_view_qna_detail(&post.author_id, viewer_id.as_deref(), viewer_is_admin)
    {
        return Err(ApiError::forbidden(
            "You do not have permission to view this Q&A post.",
        ));
    }

    if post.is_deleted || post.is_hidden {
        return Err(ApiError::not_found("This post has been removed or hidden."));
    }

    let row = find_visible_posts()
        .filter(posts::Column::Id.eq(post_id.clone()))
        .into_model::<PostForView>()
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    let comment_rows = visible_comments(db, &post_id).await?;
    let comments = comment_rows
        .into_iter()
        .map(|(comment, author)| CommentView {
            author: AuthorView {
                display_name: visibility::display_name(
                    comment.visibility_name,
                    author.as_ref().and_then(|a| a.nickname.as_deref()),
                    author.as_ref().and_then(|a| a.name.as_deref()),
                ),
            },
            author_id: comment.author_id,
            id: comment.id,
            content: comment.content,
            visibility_name: comment.visibility_name,
            created_at: comment.created_at,
        })
        .collect();

    Ok(HttpResponse::Ok().json(PostDetailResponse {
        post: PostView::render(row, viewer_id.as_deref(), viewer_is_admin),
        comments,
    }))
}

#[derive(Deserialize)]
struct UpdatePostForm {
    title: String,
    content: String,
    category: Option<String>,
    #[serde(rename = "visibilityName")]
    visibility_name: Option<String>,
}

/// Edit a post. Author only; moderators edit nothing, they hide or delete.
#[put("/api/posts/{id}")]
async fn update_post(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<UpdatePostForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let viewer_id = client.require_login()?;

    let post = posts::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    if !visibility::can_edit(&post.author_id, Some(viewer_id)) {
        return Err(ApiError::forbidden(
            "You do not have permission to edit this post.",
        ));
    }

    validate_title_and_content(&form.title, &form.content)?;

    let category = match form.category.as_deref() {
        None | Some("") => post.category,
        Some(raw) => Category::parse(raw)
            .ok_or_else(|| ApiError::validation(format!("Unknown category: {}", raw)))?,
    };
    let visibility_name = match form.visibility_name.as_deref() {
        None | Some("") => post.visibility_name,
        other => parse_visibility(other)?,
    };

    let post_id = post.id.clone();
    let mut active: posts::ActiveModel = post.into();
    active.title = Set(form.title.trim().to_string());
    active.content = Set(form.content.clone());
    active.category = Set(category);
    active.visibility_name = Set(visibility_name);
    active.updated_at = Set(Utc::now().naive_utc());
    sea_orm::ActiveModelTrait::update(active, db).await?;

    let row = find_visible_posts()
        .filter(posts::Column::Id.eq(post_id))
        .into_model::<PostForView>()
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    let viewer_is_admin = client.is_admin(db).await;
    Ok(HttpResponse::Ok().json(PostView::render(row, client.get_id(), viewer_is_admin)))
}

/// Soft-delete a post. Author or admin; the row is flagged, never removed.
#[delete("/api/posts/{id}")]
async fn delete_post(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let viewer_id = client.require_login()?;

    let post = posts::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Post not found."))?;

    let viewer_is_admin = client.is_admin(db).await;
    if !visibility::can_delete(&post.author_id, Some(viewer_id), viewer_is_admin) {
        return Err(ApiError::forbidden(
            "You do not have permission to delete this post.",
        ));
    }

    let mut active: posts::ActiveModel = post.into();
    active.is_deleted = Set(true);
    active.updated_at = Set(Utc::now().naive_utc());
    sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
