//! Integration tests for the listing predicate: soft-deleted and hidden rows
//! never surface

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use hallways::orm::posts::{self, Category};
use hallways::orm::users::Role;
use hallways::visibility::GENERAL_FEED_EXCLUDED;
use hallways::web::posts::{find_visible_posts, PostForView};
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, QueryFilter};

#[actix_rt::test]
#[serial]
async fn flagged_posts_are_excluded_from_listing() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "vis_author1", None, Role::Student)
        .await
        .expect("Failed to create author");

    let visible = create_test_post(&db, &author.external_id, Category::Free, "Visible")
        .await
        .expect("Failed to create post");
    let deleted = create_test_post(&db, &author.external_id, Category::Free, "Deleted")
        .await
        .expect("Failed to create post");
    let hidden = create_test_post(&db, &author.external_id, Category::Free, "Hidden")
        .await
        .expect("Failed to create post");

    let mut active: posts::ActiveModel = deleted.into();
    active.is_deleted = Set(true);
    sea_orm::ActiveModelTrait::update(active, &db)
        .await
        .expect("Failed to flag post");

    let mut active: posts::ActiveModel = hidden.into();
    active.is_hidden = Set(true);
    sea_orm::ActiveModelTrait::update(active, &db)
        .await
        .expect("Failed to flag post");

    let rows = find_visible_posts()
        .into_model::<PostForView>()
        .all(&db)
        .await
        .expect("Failed to list posts");

    let ids: Vec<&str> = rows.iter().map(|r| r.id.as_str()).collect();
    assert!(ids.contains(&visible.id.as_str()));
    assert_eq!(ids.len(), 1, "Flagged posts must not surface");

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn general_feed_exclusion_filters_qna_and_club() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "vis_author2", None, Role::Student)
        .await
        .expect("Failed to create author");

    create_test_post(&db, &author.external_id, Category::Free, "Free post")
        .await
        .expect("Failed to create post");
    create_test_post(&db, &author.external_id, Category::Qna, "Question")
        .await
        .expect("Failed to create post");
    create_test_post(&db, &author.external_id, Category::Club, "Club note")
        .await
        .expect("Failed to create post");

    let rows = find_visible_posts()
        .filter(posts::Column::Category.is_not_in(GENERAL_FEED_EXCLUDED.to_vec()))
        .into_model::<PostForView>()
        .all(&db)
        .await
        .expect("Failed to list posts");

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].category, Category::Free);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn author_columns_join_through_for_redaction() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "vis_author3", None, Role::Student)
        .await
        .expect("Failed to create author");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Named post")
        .await
        .expect("Failed to create post");

    let row = find_visible_posts()
        .filter(posts::Column::Id.eq(post.id.clone()))
        .into_model::<PostForView>()
        .one(&db)
        .await
        .expect("Failed to query post")
        .expect("Post not visible");

    assert_eq!(row.author_name.as_deref(), Some("Test vis_author3"));
    assert_eq!(row.author_nickname, None);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
