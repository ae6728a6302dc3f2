//! Integration tests for derived like/comment counts and the like
//! uniqueness constraint

mod common;
use serial_test::serial;

use common::{database::*, fixtures::*};
use hallways::orm::posts::Category;
use hallways::orm::users::Role;
use hallways::orm::{comments, likes};
use hallways::web::posts::{find_visible_posts, PostForView};
use sea_orm::ActiveValue::Set;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

async fn counts_for(db: &sea_orm::DatabaseConnection, post_id: &str) -> (i64, i64) {
    let row = find_visible_posts()
        .filter(hallways::orm::posts::Column::Id.eq(post_id))
        .into_model::<PostForView>()
        .one(db)
        .await
        .expect("Failed to query post")
        .expect("Post not visible");
    (row.like_count, row.comment_count)
}

#[actix_rt::test]
#[serial]
async fn comment_count_follows_comment_rows() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "eng_author1", None, Role::Student)
        .await
        .expect("Failed to create author");
    let commenter = create_test_user(&db, "eng_commenter1", None, Role::Student)
        .await
        .expect("Failed to create commenter");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Counted")
        .await
        .expect("Failed to create post");

    assert_eq!(counts_for(&db, &post.id).await, (0, 0));

    let comment = create_test_comment(&db, &post.id, &commenter.external_id, "First!")
        .await
        .expect("Failed to create comment");
    assert_eq!(counts_for(&db, &post.id).await.1, 1);

    create_test_comment(&db, &post.id, &author.external_id, "Thanks")
        .await
        .expect("Failed to create comment");
    assert_eq!(counts_for(&db, &post.id).await.1, 2);

    // Soft-deleting a comment drops the count by exactly one.
    let mut active: comments::ActiveModel = comment.into();
    active.is_deleted = Set(true);
    sea_orm::ActiveModelTrait::update(active, &db)
        .await
        .expect("Failed to soft-delete comment");
    assert_eq!(counts_for(&db, &post.id).await.1, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn hidden_comments_are_not_counted() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "eng_author2", None, Role::Student)
        .await
        .expect("Failed to create author");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Hidden comment")
        .await
        .expect("Failed to create post");

    let comment = create_test_comment(&db, &post.id, &author.external_id, "Soon hidden")
        .await
        .expect("Failed to create comment");
    assert_eq!(counts_for(&db, &post.id).await.1, 1);

    let mut active: comments::ActiveModel = comment.into();
    active.is_hidden = Set(true);
    sea_orm::ActiveModelTrait::update(active, &db)
        .await
        .expect("Failed to hide comment");
    assert_eq!(counts_for(&db, &post.id).await.1, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn like_count_follows_like_rows() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "eng_author3", None, Role::Student)
        .await
        .expect("Failed to create author");
    let fan = create_test_user(&db, "eng_fan1", None, Role::Student)
        .await
        .expect("Failed to create fan");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Liked")
        .await
        .expect("Failed to create post");

    let like = create_test_like(&db, &post.id, &fan.external_id)
        .await
        .expect("Failed to like");
    assert_eq!(counts_for(&db, &post.id).await.0, 1);

    likes::Entity::delete_by_id(like.id)
        .exec(&db)
        .await
        .expect("Failed to unlike");
    assert_eq!(counts_for(&db, &post.id).await.0, 0);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}

#[actix_rt::test]
#[serial]
async fn duplicate_like_is_rejected_by_the_unique_pair() {
    let Some(db) = setup_test_database().await else {
        return;
    };
    cleanup_test_data(&db).await.expect("Failed to cleanup");

    let author = create_test_user(&db, "eng_author4", None, Role::Student)
        .await
        .expect("Failed to create author");
    let fan = create_test_user(&db, "eng_fan2", None, Role::Student)
        .await
        .expect("Failed to create fan");
    let post = create_test_post(&db, &author.external_id, Category::Free, "Double liked")
        .await
        .expect("Failed to create post");

    create_test_like(&db, &post.id, &fan.external_id)
        .await
        .expect("Failed to like");

    // The storage layer, not the handler, is the last line of defense against
    // a toggle race.
    let second = create_test_like(&db, &post.id, &fan.external_id).await;
    let err = second.expect_err("Duplicate like must violate the unique pair");
    assert!(matches!(
        err.sql_err(),
        Some(sea_orm::SqlErr::UniqueConstraintViolation(_))
    ));

    // The count still reflects exactly one row.
    assert_eq!(counts_for(&db, &post.id).await.0, 1);

    cleanup_test_data(&db).await.expect("Failed to cleanup");
}
