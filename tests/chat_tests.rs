//! Integration tests for direct chats and messages.

use anyhow::Result;
use apartments::error::RepositoryError;
use apartments::repositories::ChatRepository;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_resident, setup_test_db};

#[tokio::test]
async fn opening_a_chat_twice_returns_the_same_chat() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let budi = create_resident(&db, "Budi").await?;
    let chats = ChatRepository::new(&db);

    let first = chats.open(rina.id, budi.id).await?;
    let second = chats.open(budi.id, rina.id).await?;

    assert_eq!(first.id, second.id);
    assert!(first.has_participant(rina.id));
    assert!(first.has_participant(budi.id));
    assert_eq!(chats.list_for_user(rina.id).await?.len(), 1);
    assert_eq!(chats.list_for_user(budi.id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
async fn chat_with_yourself_is_rejected() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;

    let result = ChatRepository::new(&db).open(rina.id, rina.id).await;
    assert!(matches!(result, Err(RepositoryError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn messages_are_returned_oldest_first() -> Result<()> {
    let db = setup_test_db().await?;
    let rina = create_resident(&db, "Rina").await?;
    let budi = create_resident(&db, "Budi").await?;
    let chats = ChatRepository::new(&db);
    let chat = chats.open(rina.id, budi.id).await?;

    chats.send(chat.id, rina.id, "Is the pool open today?").await?;
    chats.send(chat.id, budi.id, "Until 8pm").await?;

    let messages = chats.messages(chat.id).await?;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender_id, rina.id);
    assert_eq!(messages[1].content, "Until 8pm");

    assert!(matches!(
        chats.send(chat.id, rina.id, "  ").await,
        Err(RepositoryError::Validation(_))
    ));
    Ok(())
}
