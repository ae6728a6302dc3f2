//! Identity-provider sync webhook.
//!
//! The provider notifies us of account lifecycle events. Create/update
//! upserts the user row; role is assigned from the school-domain rule on
//! first creation only and never changed by a later sync. Delete removes the
//! row and tolerates it already being gone.
//!
//! Calls authenticate with a shared secret header configured at the gateway.

use crate::app_config;
use crate::db::get_db_pool;
use crate::error::{ApiError, ApiResult};
use crate::orm::users;
use crate::role;
use actix_web::{post, web, HttpRequest, HttpResponse};
use chrono::Utc;
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(identity_webhook);
}

const SECRET_HEADER: &str = "X-Webhook-Secret";

#[derive(Debug, Deserialize)]
struct WebhookEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: EventData,
}

#[derive(Debug, Deserialize)]
struct EventData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

impl EventData {
    fn primary_email(&self) -> Option<&str> {
        self.email_addresses
            .first()
            .map(|e| e.email_address.as_str())
    }

    fn full_name(&self) -> Option<String> {
        match (self.first_name.as_deref(), self.last_name.as_deref()) {
            (Some(f), Some(l)) => Some(format!("{} {}", f, l)),
            (Some(f), None) => Some(f.to_string()),
            (None, Some(l)) => Some(l.to_string()),
            (None, None) => None,
        }
    }
}

fn verify_secret(req: &HttpRequest) -> ApiResult<()> {
    let expected = app_config::auth().webhook_secret;
    if expected.is_empty() {
        log::error!("auth.webhook_secret is not configured; rejecting webhook");
        return Err(ApiError::Unauthorized);
    }

    let provided = req
        .headers()
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if provided != expected {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

#[post("/api/webhooks/identity")]
async fn identity_webhook(
    req: HttpRequest,
    event: web::Json<WebhookEvent>,
) -> ApiResult<HttpResponse> {
    verify_secret(&req)?;

    let db = get_db_pool();
    log::info!("identity webhook: {} for {}", event.event_type, event.data.id);

    match event.event_type.as_str() {
        "user.created" | "user.updated" => {
            let email = event.data.primary_email().map(str::to_string);
            let name = event.data.full_name();

            let existing = users::Entity::find()
                .filter(users::Column::ExternalId.eq(event.data.id.clone()))
                .one(db)
                .await?;

            let now = Utc::now().naive_utc();
            match existing {
                Some(user) => {
                    // Role is sticky after first sync.
                    let mut active: users::ActiveModel = user.into();
                    active.email = Set(email);
                    active.name = Set(name);
                    active.updated_at = Set(now);
                    sea_orm::ActiveModelTrait::update(active, db).await?;
                }
                None => {
                    let domains = app_config::school_email_domains();
                    let initial_role = role::initial_role_for_email(email.as_deref(), &domains);
                    log::info!(
                        "identity webhook: creating {} with role {:?}",
                        event.data.id,
                        initial_role
                    );

                    let user = users::ActiveModel {
                        id: Set(Uuid::new_v4().to_string()),
                        external_id: Set(event.data.id.clone()),
                        email: Set(email),
                        name: Set(name),
                        nickname: Set(None),
                        role: Set(initial_role),
                        created_at: Set(now),
                        updated_at: Set(now),
                    };
                    users::Entity::insert(user).exec(db).await?;
                }
            }
        }
        "user.deleted" => {
            let deleted = users::Entity::delete_many()
                .filter(users::Column::ExternalId.eq(event.data.id.clone()))
                .exec(db)
                .await?;

            if deleted.rows_affected == 0 {
                log::warn!(
                    "identity webhook: delete for unknown user {}",
                    event.data.id
                );
            }
            role::invalidate_role(&event.data.id);
        }
        other => {
            log::warn!("identity webhook: unhandled event type {}", other);
        }
    }

    Ok(HttpResponse::Ok().json(json!({ "success": true })))
}
