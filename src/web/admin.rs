//! Administration and moderation console endpoints.
//!
//! Everything here requires the ADMIN role, checked before any mutation.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::moderation::{self, ModerationAction};
use crate::orm::reports::{self, ReportStatus};
use crate::orm::users::{self, Role};
use crate::orm::{admin_actions, suggestions};
use crate::role;
use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder, QuerySelect};
use serde::Deserialize;
use serde_json::json;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_reports)
        .service(view_report)
        .service(apply_report_action)
        .service(list_users)
        .service(update_user_role)
        .service(clear_suggestions);
}

#[derive(Deserialize)]
struct ReportsQuery {
    status: Option<String>,
}

fn parse_status(value: &str) -> ApiResult<ReportStatus> {
    match value {
        "PENDING" => Ok(ReportStatus::Pending),
        "REVIEWED" => Ok(ReportStatus::Reviewed),
        "RESOLVED" => Ok(ReportStatus::Resolved),
        "DISMISSED" => Ok(ReportStatus::Dismissed),
        other => Err(ApiError::validation(format!("Unknown status: {}", other))),
    }
}

/// List reports, newest first, optionally filtered by status.
#[get("/api/admin/reports")]
async fn list_reports(
    client: ClientCtx,
    query: web::Query<ReportsQuery>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let mut find = reports::Entity::find().order_by_desc(reports::Column::CreatedAt);

    match query.status.as_deref() {
        None | Some("all") => {}
        Some(raw) => {
            find = find.filter(reports::Column::Status.eq(parse_status(raw)?));
        }
    }

    let rows = find.limit(100).all(db).await?;
    Ok(HttpResponse::Ok().json(rows))
}

/// Report detail with its audit trail.
#[get("/api/admin/reports/{id}")]
async fn view_report(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let report = reports::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found."))?;

    let actions = admin_actions::Entity::find()
        .filter(admin_actions::Column::ReportId.eq(report.id.clone()))
        .order_by_asc(admin_actions::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "report": report,
        "actions": actions,
    })))
}

#[derive(Deserialize)]
struct ActionForm {
    #[serde(rename = "actionType")]
    action_type: String,
    description: Option<String>,
}

/// Apply a moderation action to a report. Target mutation, status transition,
/// and audit insert happen atomically in the state machine.
#[post("/api/admin/reports/{id}/action")]
async fn apply_report_action(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<ActionForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let admin_id = client.require_admin(db).await?;

    if form.action_type.is_empty() {
        return Err(ApiError::validation("Please select an action type."));
    }
    let action = ModerationAction::parse(&form.action_type)
        .ok_or_else(|| ApiError::validation("Invalid action type."))?;

    let receipt = moderation::apply_action(
        db,
        &path.into_inner(),
        &admin_id,
        action,
        form.description.clone(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(json!({
        "success": true,
        "report": receipt.report,
        "adminAction": receipt.admin_action,
        "targetUpdated": receipt.target_updated,
        "message": "Action completed successfully.",
    })))
}

/// List all users, newest first.
#[get("/api/admin/users")]
async fn list_users(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let rows = users::Entity::find()
        .order_by_desc(users::Column::CreatedAt)
        .all(db)
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
struct RoleForm {
    #[serde(rename = "userId")]
    user_id: String,
    role: String,
}

/// Explicitly change a user's role. The only path besides SUSPEND that
/// mutates roles after first sync.
#[patch("/api/admin/users")]
async fn update_user_role(client: ClientCtx, form: web::Json<RoleForm>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    if form.user_id.is_empty() || form.role.is_empty() {
        return Err(ApiError::validation("userId and role are required."));
    }
    let new_role =
        Role::from_str_value(&form.role).ok_or_else(|| ApiError::validation("Invalid role value."))?;

    let user = users::Entity::find_by_id(form.user_id.clone())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found."))?;

    let external_id = user.external_id.clone();
    let mut active: users::ActiveModel = user.into();
    active.role = Set(new_role);
    active.updated_at = Set(Utc::now().naive_utc());
    let user = sea_orm::ActiveModelTrait::update(active, db).await?;

    role::invalidate_role(&external_id);
    log::info!("admin: role of {} set to {:?}", external_id, new_role);

    Ok(HttpResponse::Ok().json(user))
}

/// Clear the suggestion inbox.
#[delete("/api/admin/suggestions")]
async fn clear_suggestions(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_admin(db).await?;

    let result = suggestions::Entity::delete_many().exec(db).await?;

    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Successfully cleared {} suggestion(s).", result.rows_affected),
        "count": result.rows_affected,
    })))
}
