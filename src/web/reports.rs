//! Report submission.
//!
//! Any authenticated user may report a post or a comment. Repeat reports from
//! the same reporter merge into the existing PENDING report (201 on create,
//! 200 on merge).

use crate::db::get_db_pool;
use crate::middleware::ClientCtx;
use crate::moderation::{self, ReportTarget};
use actix_web::{post, web, HttpResponse};
use serde::Deserialize;

pub(super) fn configure(conf: &mut actix_web::web::ServiceConfig) {
    conf.service(submit_report);
}

#[derive(Deserialize)]
struct ReportForm {
    #[serde(rename = "postId")]
    post_id: Option<String>,
    #[serde(rename = "commentId")]
    comment_id: Option<String>,
    reason: String,
}

#[post("/api/reports")]
async fn submit_report(
    client: ClientCtx,
    form: web::Json<ReportForm>,
) -> crate::error::ApiResult<HttpResponse> {
    let db = get_db_pool();
    let identity = client.require_identity()?.clone();
    let reporter_id = identity.external_id.clone();

    let target = ReportTarget::from_ids(form.post_id.clone(), form.comment_id.clone())?;

    super::users::ensure_user(db, &identity).await?;

    let submitted = moderation::submit_report(db, &reporter_id, target, &form.reason).await?;

    if submitted.created {
        Ok(HttpResponse::Created().json(submitted.report))
    } else {
        Ok(HttpResponse::Ok().json(submitted.report))
    }
}
