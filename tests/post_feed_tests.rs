//! Integration tests for the social feed, its cursor pagination and
//! feedback threads.

use std::collections::HashSet;

use anyhow::Result;
use apartments::cursor::{decode_cursor, encode_cursor};
use apartments::error::RepositoryError;
use apartments::repositories::PostRepository;
use uuid::Uuid;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_resident, setup_test_db};

#[tokio::test]
async fn feed_pages_cover_every_post_once_newest_first() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let posts = PostRepository::new(&db);

    let mut created = Vec::new();
    for n in 0..7 {
        created.push(posts.create(rina.id, &format!("post number {n}")).await?.id);
    }

    let mut seen = Vec::new();
    let mut cursor = None;
    loop {
        let page = posts.feed(cursor, 3).await?;
        assert!(page.posts.len() <= 3);
        seen.extend(page.posts.iter().map(|post| post.id));
        match page.next {
            // Cursors survive the opaque string round trip the API uses
            Some(next) => {
                cursor = Some(decode_cursor(&encode_cursor(&next)).expect("cursor decodes"))
            }
            None => break,
        }
    }

    assert_eq!(seen.len(), created.len());
    assert_eq!(seen.iter().collect::<HashSet<_>>().len(), created.len());
    assert_eq!(seen.first(), created.last());
    assert_eq!(seen.last(), created.first());
    Ok(())
}

#[tokio::test]
async fn exact_page_has_no_next_cursor() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let posts = PostRepository::new(&db);
    posts.create(rina.id, "first").await?;
    posts.create(rina.id, "second").await?;

    let page = posts.feed(None, 2).await?;
    assert_eq!(page.posts.len(), 2);
    assert!(page.next.is_none());
    Ok(())
}

#[tokio::test]
async fn feedbacks_are_listed_oldest_first() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let budi = create_resident(&db, "Budi").await?;
    let posts = PostRepository::new(&db);
    let post = posts.create(rina.id, "Lift on block B is fixed").await?;

    let first = posts.add_feedback(post.id, budi.id, "Thanks!").await?;
    let second = posts.add_feedback(post.id, rina.id, "You're welcome").await?;

    let thread = posts.list_feedbacks(post.id).await?;
    assert_eq!(
        thread.iter().map(|f| f.id).collect::<Vec<_>>(),
        vec![first.id, second.id]
    );

    posts.delete_feedback(first.id).await?;
    assert_eq!(posts.list_feedbacks(post.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn empty_content_and_unknown_post_are_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let posts = PostRepository::new(&db);

    assert!(matches!(
        posts.create(rina.id, "   ").await,
        Err(RepositoryError::Validation(_))
    ));
    assert!(matches!(
        posts.add_feedback(Uuid::new_v4(), rina.id, "hello").await,
        Err(RepositoryError::NotFound { code: "POST_NOT_FOUND", .. })
    ));
    Ok(())
}

#[tokio::test]
async fn deleting_a_post_removes_its_feedbacks() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let posts = PostRepository::new(&db);
    let post = posts.create(rina.id, "Garage sale on Saturday").await?;
    let feedback = posts.add_feedback(post.id, rina.id, "Starts at 9").await?;

    posts.delete(post.id).await?;

    assert!(posts.get(post.id).await.is_err());
    assert!(matches!(
        posts.get_feedback(feedback.id).await,
        Err(RepositoryError::NotFound { code: "FEEDBACK_NOT_FOUND", .. })
    ));
    Ok(())
}
