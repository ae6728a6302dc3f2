//! Integration tests for admin moderation actions

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use hallways::moderation::{self, ModerationAction, ReportTarget};
use hallways::orm::admin_actions::{self, AdminActionType};
use hallways::orm::posts::Category;
use hallways::orm::reports::ReportStatus;
use hallways::orm::users::{self, Role};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

async fn report_on_new_post(
    db: &sea_orm::DatabaseConnection,
    suffix: &str,
) -> (hallways::orm::posts::Model, hallways::orm::reports::Model, users::Model) {
    let reporter = create_test_user(db, &format!("mod_rep_{}", suffix), None, Role::Student)
        .await
        .expect("Failed to create reporter");
    let author = create_test_user(db, &format!("mod_author_{}", suffix), None, Role::Student)
        .await
        .expect("Failed to create author");
    let admin = create_test_user(db, &format!("mod_admin_{}", suffix), None, Role::Admin)
        .await
        .expect("Failed to create admin");
    let post = create_test_post(db, &author.external_id, Category::Free, "Reported post")
        .await
        .expect("Failed to create post");

    let submitted = moderation::submit_report(
        db,
        &reporter.external_id,
        ReportTarget::Post(post.id.clone()),
        "needs review",
    )
    .await
    .expect("Report failed");

    (post, submitted.report, admin)
}

#[actix_rt::test]
#[serial]
async fn delete_action_is_atomic_across_all_three_writes() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let (post, report, admin) = report_on_new_post(&db, "del").await;

    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Delete,
        Some("removing spam".to_string()),
    )
    .await
    .expect("Action failed");

    // All three effects, together.
    let post_row = hallways::orm::posts::Entity::find_by_id(post.id.clone())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post vanished");
    assert!(post_row.is_deleted);
    assert_eq!(receipt.report.status, ReportStatus::Resolved);

    let audit_count = admin_actions::Entity::find()
        .filter(admin_actions::Column::ReportId.eq(report.id.clone()))
        .filter(admin_actions::Column::ActionType.eq(AdminActionType::Delete))
        .count(&db)
        .await
        .expect("Failed to count audit rows");
    assert_eq!(audit_count, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn hide_action_hides_target_and_resolves() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let (post, report, admin) = report_on_new_post(&db, "hide").await;

    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Hide,
        None,
    )
    .await
    .expect("Action failed");

    let post_row = hallways::orm::posts::Entity::find_by_id(post.id.clone())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post vanished");
    assert!(post_row.is_hidden);
    assert!(!post_row.is_deleted);
    assert_eq!(receipt.report.status, ReportStatus::Resolved);
    assert!(receipt.target_updated);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn warning_reviews_without_touching_target_and_allows_a_second_action() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let (post, report, admin) = report_on_new_post(&db, "warn").await;

    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Warning,
        Some("first strike".to_string()),
    )
    .await
    .expect("Warning failed");

    assert_eq!(receipt.report.status, ReportStatus::Reviewed);
    assert!(!receipt.target_updated);

    let post_row = hallways::orm::posts::Entity::find_by_id(post.id.clone())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post vanished");
    assert!(!post_row.is_deleted);
    assert!(!post_row.is_hidden);

    // REVIEWED is not terminal; a later action overwrites it.
    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Delete,
        None,
    )
    .await
    .expect("Follow-up action failed");
    assert_eq!(receipt.report.status, ReportStatus::Resolved);

    let audit_count = admin_actions::Entity::find()
        .filter(admin_actions::Column::ReportId.eq(report.id.clone()))
        .count(&db)
        .await
        .expect("Failed to count audit rows");
    assert_eq!(audit_count, 2, "Both WARNING and DELETE are logged");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn dismiss_closes_without_audit_row_or_target_mutation() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let (post, report, admin) = report_on_new_post(&db, "dis").await;

    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Dismiss,
        None,
    )
    .await
    .expect("Dismiss failed");

    assert_eq!(receipt.report.status, ReportStatus::Dismissed);
    assert!(receipt.admin_action.is_none());
    assert!(!receipt.target_updated);

    let post_row = hallways::orm::posts::Entity::find_by_id(post.id.clone())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post vanished");
    assert!(!post_row.is_deleted);
    assert!(!post_row.is_hidden);

    let audit_count = admin_actions::Entity::find()
        .filter(admin_actions::Column::ReportId.eq(report.id.clone()))
        .count(&db)
        .await
        .expect("Failed to count audit rows");
    assert_eq!(audit_count, 0, "DISMISS is never logged as an admin action");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn suspend_sets_author_role_to_visitor() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let (post, report, admin) = report_on_new_post(&db, "susp").await;

    let receipt = moderation::apply_action(
        &db,
        &report.id,
        &admin.external_id,
        ModerationAction::Suspend,
        Some("repeat offender".to_string()),
    )
    .await
    .expect("Suspend failed");

    assert_eq!(receipt.report.status, ReportStatus::Resolved);
    assert!(receipt.target_updated);

    let author = users::Entity::find()
        .filter(users::Column::ExternalId.eq(post.author_id.clone()))
        .one(&db)
        .await
        .expect("Failed to fetch author")
        .expect("Author vanished");
    assert_eq!(author.role, Role::Visitor);

    // The content itself is untouched by SUSPEND.
    let post_row = hallways::orm::posts::Entity::find_by_id(post.id.clone())
        .one(&db)
        .await
        .expect("Failed to fetch post")
        .expect("Post vanished");
    assert!(!post_row.is_deleted);
    assert!(!post_row.is_hidden);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn suspend_with_unresolvable_author_still_resolves_and_logs() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let reporter = create_test_user(&db, "mod_rep_orphan", None, Role::Student)
        .await
        .expect("Failed to create reporter");
    let author = create_test_user(&db, "mod_author_orphan", None, Role::Student)
        .await
        .expect("Failed to create author");
    let admin = create_test_user(&db, "mod_admin_orphan", None, Role::Admin)
        .await
        .expect("Failed to create admin");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Orphaned")
        .await
        .expect("Failed to create post");

    let submitted = moderation::submit_report(
        &db,
        &reporter.external_id,
        ReportTarget::Post(post.id.clone()),
        "orphan case",
    )
    .await
    .expect("Report failed");

    // Remove the post out from under the report; ON DELETE SET NULL leaves
    // the report with no resolvable target author.
    hallways::orm::posts::Entity::delete_by_id(post.id.clone())
        .exec(&db)
        .await
        .expect("Failed to hard-delete post");

    let receipt = moderation::apply_action(
        &db,
        &submitted.report.id,
        &admin.external_id,
        ModerationAction::Suspend,
        None,
    )
    .await
    .expect("Suspend failed");

    // No-op mutation, but the transition and the audit row still happen.
    assert!(!receipt.target_updated);
    assert_eq!(receipt.report.status, ReportStatus::Resolved);
    assert!(receipt.admin_action.is_some());

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn action_on_missing_report_is_not_found() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let admin = create_test_user(&db, "mod_admin_nf", None, Role::Admin)
        .await
        .expect("Failed to create admin");

    let result = moderation::apply_action(
        &db,
        "no-such-report",
        &admin.external_id,
        ModerationAction::Hide,
        None,
    )
    .await;

    assert!(matches!(
        result,
        Err(hallways::error::ApiError::NotFound(_))
    ));

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
