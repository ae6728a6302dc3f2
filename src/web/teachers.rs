//! Teacher directory endpoints.
//!
//! The directory itself is public. Profiles are curated by ADMIN/STAFF;
//! a TEACHER-role user manages their own linked profile via /api/teachers/me.

use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::middleware::ClientCtx;
use crate::orm::teachers;
use crate::orm::users::{self, Role};
use actix_web::{delete, get, patch, post, put, web, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(list_teachers)
        .service(my_profile)
        .service(upsert_my_profile)
        .service(delete_my_profile)
        .service(create_teacher)
        .service(view_teacher)
        .service(update_teacher)
        .service(set_teacher_active)
        .service(delete_teacher);
}

const PROFILE_ROLES: [Role; 3] = [Role::Teacher, Role::Staff, Role::Admin];
const CURATOR_ROLES: [Role; 2] = [Role::Admin, Role::Staff];

/// Active teacher profiles, ordered by name. Public.
#[get("/api/teachers")]
async fn list_teachers() -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let rows = teachers::Entity::find()
        .filter(teachers::Column::IsActive.eq(true))
        .order_by_asc(teachers::Column::Name)
        .all(db)
        .await?;

    Ok(HttpResponse::Ok().json(rows))
}

#[derive(Deserialize)]
struct TeacherForm {
    #[serde(rename = "userId")]
    user_id: Option<String>,
    name: String,
    subject: Option<String>,
    email: Option<String>,
    bio: Option<String>,
    #[serde(rename = "profileImage")]
    profile_image: Option<String>,
}

fn trimmed(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Create a teacher profile for a user. ADMIN/STAFF only.
#[post("/api/teachers")]
async fn create_teacher(client: ClientCtx, form: web::Json<TeacherForm>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_any_role(db, &CURATOR_ROLES).await?;

    let user_id = trimmed(&form.user_id)
        .ok_or_else(|| ApiError::validation("User ID is required."))?;
    if form.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required."));
    }

    let user_exists = users::Entity::find()
        .filter(users::Column::ExternalId.eq(user_id.clone()))
        .one(db)
        .await?
        .is_some();
    if !user_exists {
        return Err(ApiError::not_found("User not found."));
    }

    let existing = teachers::Entity::find()
        .filter(teachers::Column::UserId.eq(user_id.clone()))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "This user already has a teacher profile.".to_string(),
        ));
    }

    let now = Utc::now().naive_utc();
    let teacher = teachers::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        user_id: Set(Some(user_id)),
        name: Set(form.name.trim().to_string()),
        subject: Set(trimmed(&form.subject)),
        email: Set(trimmed(&form.email)),
        bio: Set(trimmed(&form.bio)),
        profile_image: Set(trimmed(&form.profile_image)),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    };
    let teacher = teachers::Entity::insert(teacher)
        .exec_with_returning(db)
        .await?;

    Ok(HttpResponse::Created().json(teacher))
}

/// The caller's own profile, or null when none exists yet.
#[get("/api/teachers/me")]
async fn my_profile(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let (user_id, _) = client.require_any_role(db, &PROFILE_ROLES).await?;

    let teacher = teachers::Entity::find()
        .filter(teachers::Column::UserId.eq(user_id))
        .one(db)
        .await?;

    Ok(HttpResponse::Ok().json(teacher))
}

/// Create or update the caller's own profile.
#[put("/api/teachers/me")]
async fn upsert_my_profile(
    client: ClientCtx,
    form: web::Json<TeacherForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let (user_id, _) = client.require_any_role(db, &PROFILE_ROLES).await?;

    if form.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required."));
    }

    let existing = teachers::Entity::find()
        .filter(teachers::Column::UserId.eq(user_id.clone()))
        .one(db)
        .await?;

    let now = Utc::now().naive_utc();
    let teacher = match existing {
        Some(teacher) => {
            let mut active: teachers::ActiveModel = teacher.into();
            active.name = Set(form.name.trim().to_string());
            active.subject = Set(trimmed(&form.subject));
            active.email = Set(trimmed(&form.email));
            active.bio = Set(trimmed(&form.bio));
            active.profile_image = Set(trimmed(&form.profile_image));
            active.updated_at = Set(now);
            sea_orm::ActiveModelTrait::update(active, db).await?
        }
        None => {
            let teacher = teachers::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                user_id: Set(Some(user_id)),
                name: Set(form.name.trim().to_string()),
                subject: Set(trimmed(&form.subject)),
                email: Set(trimmed(&form.email)),
                bio: Set(trimmed(&form.bio)),
                profile_image: Set(trimmed(&form.profile_image)),
                is_active: Set(true),
                created_at: Set(now),
                updated_at: Set(now),
            };
            teachers::Entity::insert(teacher)
                .exec_with_returning(db)
                .await?
        }
    };

    Ok(HttpResponse::Ok().json(teacher))
}

/// Delete the caller's own profile.
#[delete("/api/teachers/me")]
async fn delete_my_profile(client: ClientCtx) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    let (user_id, _) = client.require_any_role(db, &PROFILE_ROLES).await?;

    let deleted = teachers::Entity::delete_many()
        .filter(teachers::Column::UserId.eq(user_id))
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(ApiError::not_found("No teacher profile to delete."));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Profile deleted successfully." })))
}

/// Single profile, public.
#[get("/api/teachers/{id}")]
async fn view_teacher(path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();

    let teacher = teachers::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found."))?;

    Ok(HttpResponse::Ok().json(teacher))
}

/// Edit another teacher's profile. ADMIN/STAFF only.
#[put("/api/teachers/{id}")]
async fn update_teacher(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<TeacherForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_any_role(db, &CURATOR_ROLES).await?;

    if form.name.trim().is_empty() {
        return Err(ApiError::validation("Name is required."));
    }

    let teacher = teachers::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found."))?;

    let mut active: teachers::ActiveModel = teacher.into();
    active.name = Set(form.name.trim().to_string());
    active.subject = Set(trimmed(&form.subject));
    active.email = Set(trimmed(&form.email));
    active.bio = Set(trimmed(&form.bio));
    active.profile_image = Set(trimmed(&form.profile_image));
    active.updated_at = Set(Utc::now().naive_utc());
    let teacher = sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(teacher))
}

#[derive(Deserialize)]
struct ActiveForm {
    #[serde(rename = "isActive")]
    is_active: bool,
}

/// Show or hide a profile in the public directory. ADMIN/STAFF only.
#[patch("/api/teachers/{id}")]
async fn set_teacher_active(
    client: ClientCtx,
    path: web::Path<String>,
    form: web::Json<ActiveForm>,
) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_any_role(db, &CURATOR_ROLES).await?;

    let teacher = teachers::Entity::find_by_id(path.into_inner())
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Teacher not found."))?;

    let mut active: teachers::ActiveModel = teacher.into();
    active.is_active = Set(form.is_active);
    active.updated_at = Set(Utc::now().naive_utc());
    let teacher = sea_orm::ActiveModelTrait::update(active, db).await?;

    Ok(HttpResponse::Ok().json(teacher))
}

/// Remove a profile entirely. ADMIN/STAFF only.
#[delete("/api/teachers/{id}")]
async fn delete_teacher(client: ClientCtx, path: web::Path<String>) -> ApiResult<HttpResponse> {
    let db = get_db_pool();
    client.require_any_role(db, &CURATOR_ROLES).await?;

    let deleted = teachers::Entity::delete_by_id(path.into_inner())
        .exec(db)
        .await?;

    if deleted.rows_affected == 0 {
        return Err(ApiError::not_found("Teacher not found."));
    }

    Ok(HttpResponse::Ok().json(json!({ "message": "Profile deleted successfully." })))
}
