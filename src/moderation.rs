//! Report lifecycle and admin moderation actions.
//!
//! Reports: created by any authenticated user against exactly one post or
//! comment. A repeat report from the same reporter while the first is still
//! PENDING merges into it instead of creating a second row. Admin actions
//! mutate the target, transition the report, and append to the audit log as
//! one atomic unit.

use crate::error::{ApiError, ApiResult};
use crate::orm::admin_actions::{self, AdminActionType};
use crate::orm::reports::{self, ReportStatus};
use crate::orm::users::{self, Role};
use crate::orm::{comments, posts};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::ActiveValue::Set;
use sea_orm::{
    ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait, QueryFilter,
    TransactionTrait,
};
use uuid::Uuid;

/// The single thing a report points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReportTarget {
    Post(String),
    Comment(String),
}

impl ReportTarget {
    /// Build from the request's optional ids: exactly one must be present.
    pub fn from_ids(post_id: Option<String>, comment_id: Option<String>) -> ApiResult<Self> {
        match (post_id, comment_id) {
            (Some(p), None) if !p.is_empty() => Ok(ReportTarget::Post(p)),
            (None, Some(c)) if !c.is_empty() => Ok(ReportTarget::Comment(c)),
            (Some(_), Some(_)) => Err(ApiError::validation(
                "A report targets either a post or a comment, not both.",
            )),
            _ => Err(ApiError::validation("A post or comment id is required.")),
        }
    }

    fn post_id(&self) -> Option<String> {
        match self {
            ReportTarget::Post(id) => Some(id.clone()),
            ReportTarget::Comment(_) => None,
        }
    }

    fn comment_id(&self) -> Option<String> {
        match self {
            ReportTarget::Post(_) => None,
            ReportTarget::Comment(id) => Some(id.clone()),
        }
    }
}

/// Outcome of submitting a report.
pub struct SubmittedReport {
    pub report: reports::Model,
    /// False when the submission merged into an existing PENDING report.
    pub created: bool,
}

/// Create a report, or merge into the reporter's existing PENDING report
/// against the same target (count increments, reason is replaced with the
/// latest text). Reports against targets in a terminal state start fresh.
pub async fn submit_report(
    db: &DatabaseConnection,
    reporter_id: &str,
    target: ReportTarget,
    reason: &str,
) -> ApiResult<SubmittedReport> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(ApiError::validation("A report reason is required."));
    }

    if let Some(existing) = find_pending(db, reporter_id, &target).await? {
        let report = merge_into(db, existing, reason).await?;
        return Ok(SubmittedReport {
            report,
            created: false,
        });
    }

    let now = Utc::now().naive_utc();
    let new_report = reports::ActiveModel {
        id: Set(Uuid::new_v4().to_string()),
        reporter_id: Set(reporter_id.to_string()),
        post_id: Set(target.post_id()),
        comment_id: Set(target.comment_id()),
        reason: Set(reason.to_string()),
        report_count: Set(1),
        status: Set(ReportStatus::Pending),
        created_at: Set(now),
        updated_at: Set(now),
    };

    match reports::Entity::insert(new_report).exec_with_returning(db).await {
        Ok(report) => Ok(SubmittedReport {
            report,
            created: true,
        }),
        Err(err) if err.sql_err().map_or(false, |e| {
            matches!(e, sea_orm::SqlErr::UniqueConstraintViolation(_))
        }) =>
        {
            // Lost a race with a concurrent report from the same reporter.
            // The partial unique index guarantees a PENDING row now exists;
            // merge into it instead.
            let existing = find_pending(db, reporter_id, &target)
                .await?
                .ok_or(ApiError::Internal)?;
            let report = merge_into(db, existing, reason).await?;
            Ok(SubmittedReport {
                report,
                created: false,
            })
        }
        Err(err) => Err(err.into()),
    }
}

async fn find_pending(
    db: &DatabaseConnection,
    reporter_id: &str,
    target: &ReportTarget,
) -> ApiResult<Option<reports::Model>> {
    let mut query = reports::Entity::find()
        .filter(reports::Column::ReporterId.eq(reporter_id))
        .filter(reports::Column::Status.eq(ReportStatus::Pending));

    query = match target {
        ReportTarget::Post(id) => query.filter(reports::Column::PostId.eq(id.clone())),
        ReportTarget::Comment(id) => query.filter(reports::Column::CommentId.eq(id.clone())),
    };

    Ok(query.one(db).await?)
}

async fn merge_into(
    db: &DatabaseConnection,
    existing: reports::Model,
    reason: &str,
) -> ApiResult<reports::Model> {
    let count = existing.report_count;
    let mut active: reports::ActiveModel = existing.into();
    active.report_count = Set(count + 1);
    active.reason = Set(reason.to_string());
    active.updated_at = Set(Utc::now().naive_utc());

    Ok(sea_orm::ActiveModelTrait::update(active, db).await?)
}

/// Everything an admin can do to a report. DISMISS closes the report without
/// touching the target and without an audit row, so it is not an
/// `AdminActionType`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModerationAction {
    Hide,
    Delete,
    Warning,
    Suspend,
    Dismiss,
}

impl ModerationAction {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "HIDE" => Some(ModerationAction::Hide),
            "DELETE" => Some(ModerationAction::Delete),
            "WARNING" => Some(ModerationAction::Warning),
            "SUSPEND" => Some(ModerationAction::Suspend),
            "DISMISS" => Some(ModerationAction::Dismiss),
            _ => None,
        }
    }
}

/// What an action does to its target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetMutation {
    SetHidden,
    SetDeleted,
    SuspendAuthor,
    None,
}

/// The action table: target mutation, resulting report status, and whether an
/// audit row is written. Exhaustive so a new action kind cannot silently
/// no-op.
pub fn action_outcome(action: ModerationAction) -> (TargetMutation, ReportStatus, Option<AdminActionType>) {
    match action {
        ModerationAction::Hide => (
            TargetMutation::SetHidden,
            ReportStatus::Resolved,
            Some(AdminActionType::Hide),
        ),
        ModerationAction::Delete => (
            TargetMutation::SetDeleted,
            ReportStatus::Resolved,
            Some(AdminActionType::Delete),
        ),
        ModerationAction::Warning => (
            TargetMutation::None,
            ReportStatus::Reviewed,
            Some(AdminActionType::Warning),
        ),
        ModerationAction::Suspend => (
            TargetMutation::SuspendAuthor,
            ReportStatus::Resolved,
            Some(AdminActionType::Suspend),
        ),
        ModerationAction::Dismiss => (TargetMutation::None, ReportStatus::Dismissed, None),
    }
}

/// Result of applying an admin action.
pub struct ActionReceipt {
    pub report: reports::Model,
    pub admin_action: Option<admin_actions::Model>,
    pub target_updated: bool,
}

/// Apply an admin action to a report.
///
/// The target mutation, the report status transition, and the audit-log
/// insert commit together or not at all. The caller has already verified the
/// actor holds the ADMIN role.
pub async fn apply_action(
    db: &DatabaseConnection,
    report_id: &str,
    admin_id: &str,
    action: ModerationAction,
    description: Option<String>,
) -> ApiResult<ActionReceipt> {
    let report = reports::Entity::find_by_id(report_id)
        .one(db)
        .await?
        .ok_or_else(|| ApiError::not_found("Report not found."))?;

    let (mutation, new_status, logged) = action_outcome(action);
    let now = Utc::now().naive_utc();

    let txn = db.begin().await?;

    let (target_updated, suspended_author) = match mutation {
        TargetMutation::SetHidden => (set_flags(&txn, &report, true, false).await?, None),
        TargetMutation::SetDeleted => (set_flags(&txn, &report, false, true).await?, None),
        TargetMutation::SuspendAuthor => suspend_author(&txn, &report).await?,
        TargetMutation::None => (false, None),
    };

    let mut active: reports::ActiveModel = report.into();
    active.status = Set(new_status);
    active.updated_at = Set(now);
    let report = sea_orm::ActiveModelTrait::update(active, &txn).await?;

    let admin_action = match logged {
        Some(action_type) => {
            let row = admin_actions::ActiveModel {
                id: Set(Uuid::new_v4().to_string()),
                report_id: Set(report.id.clone()),
                admin_id: Set(admin_id.to_string()),
                action_type: Set(action_type),
                description: Set(description.and_then(|d| {
                    let d = d.trim().to_string();
                    (!d.is_empty()).then_some(d)
                })),
                created_at: Set(now),
            };
            Some(admin_actions::Entity::insert(row).exec_with_returning(&txn).await?)
        }
        None => None,
    };

    txn.commit().await?;

    // Role changed inside the transaction; drop any cached copy now.
    if let Some(author_id) = suspended_author {
        crate::role::invalidate_role(&author_id);
    }

    log::info!(
        "moderation: report {} -> {:?} by {} (target updated: {})",
        report.id,
        report.status,
        admin_id,
        target_updated
    );

    Ok(ActionReceipt {
        report,
        admin_action,
        target_updated,
    })
}

/// Flip is_hidden / is_deleted on the report's target. Returns whether a row
/// was actually touched (a vanished target is tolerated).
async fn set_flags(
    txn: &DatabaseTransaction,
    report: &reports::Model,
    hidden: bool,
    deleted: bool,
) -> ApiResult<bool> {
    let rows = if let Some(post_id) = &report.post_id {
        let mut update = posts::Entity::update_many().filter(posts::Column::Id.eq(post_id.clone()));
        if hidden {
            update = update.col_expr(posts::Column::IsHidden, Expr::value(true));
        }
        if deleted {
            update = update.col_expr(posts::Column::IsDeleted, Expr::value(true));
        }
        update.exec(txn).await?.rows_affected
    } else if let Some(comment_id) = &report.comment_id {
        let mut update =
            comments::Entity::update_many().filter(comments::Column::Id.eq(comment_id.clone()));
        if hidden {
            update = update.col_expr(comments::Column::IsHidden, Expr::value(true));
        }
        if deleted {
            update = update.col_expr(comments::Column::IsDeleted, Expr::value(true));
        }
        update.exec(txn).await?.rows_affected
    } else {
        0
    };

    Ok(rows > 0)
}

/// Set the target author's role to VISITOR. When the author cannot be
/// resolved (orphaned target) this is a no-op: the status transition and the
/// audit row still happen.
async fn suspend_author(
    txn: &DatabaseTransaction,
    report: &reports::Model,
) -> ApiResult<(bool, Option<String>)> {
    let author_id = if let Some(post_id) = &report.post_id {
        posts::Entity::find_by_id(post_id.clone())
            .one(txn)
            .await?
            .map(|p| p.author_id)
    } else if let Some(comment_id) = &report.comment_id {
        comments::Entity::find_by_id(comment_id.clone())
            .one(txn)
            .await?
            .map(|c| c.author_id)
    } else {
        None
    };

    let Some(author_id) = author_id else {
        log::warn!("suspend: no resolvable author for report {}", report.id);
        return Ok((false, None));
    };

    let rows = users::Entity::update_many()
        .col_expr(users::Column::Role, Expr::value(Role::Visitor))
        .col_expr(users::Column::UpdatedAt, Expr::value(Utc::now().naive_utc()))
        .filter(users::Column::ExternalId.eq(author_id.clone()))
        .exec(txn)
        .await?
        .rows_affected;

    Ok((rows > 0, (rows > 0).then_some(author_id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn target_requires_exactly_one_id() {
        assert_eq!(
            ReportTarget::from_ids(Some("p1".into()), None).unwrap(),
            ReportTarget::Post("p1".into())
        );
        assert_eq!(
            ReportTarget::from_ids(None, Some("c1".into())).unwrap(),
            ReportTarget::Comment("c1".into())
        );
        assert!(ReportTarget::from_ids(None, None).is_err());
        assert!(ReportTarget::from_ids(Some("p1".into()), Some("c1".into())).is_err());
        assert!(ReportTarget::from_ids(Some("".into()), None).is_err());
    }

    #[test]
    fn action_table_matches_policy() {
        assert_eq!(
            action_outcome(ModerationAction::Hide),
            (
                TargetMutation::SetHidden,
                ReportStatus::Resolved,
                Some(AdminActionType::Hide)
            )
        );
        assert_eq!(
            action_outcome(ModerationAction::Delete),
            (
                TargetMutation::SetDeleted,
                ReportStatus::Resolved,
                Some(AdminActionType::Delete)
            )
        );
        assert_eq!(
            action_outcome(ModerationAction::Warning),
            (
                TargetMutation::None,
                ReportStatus::Reviewed,
                Some(AdminActionType::Warning)
            )
        );
        assert_eq!(
            action_outcome(ModerationAction::Suspend),
            (
                TargetMutation::SuspendAuthor,
                ReportStatus::Resolved,
                Some(AdminActionType::Suspend)
            )
        );
    }

    #[test]
    fn dismiss_closes_without_an_audit_row() {
        let (mutation, status, logged) = action_outcome(ModerationAction::Dismiss);
        assert_eq!(mutation, TargetMutation::None);
        assert_eq!(status, ReportStatus::Dismissed);
        assert!(logged.is_none());
    }

    #[test]
    fn action_parsing_is_closed() {
        assert_eq!(ModerationAction::parse("HIDE"), Some(ModerationAction::Hide));
        assert_eq!(
            ModerationAction::parse("DISMISS"),
            Some(ModerationAction::Dismiss)
        );
        assert_eq!(ModerationAction::parse("hide"), None);
        assert_eq!(ModerationAction::parse("BAN"), None);
    }
}
