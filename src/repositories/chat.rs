//! # Direct Chat Repository
//!
//! A chat is keyed by its unordered pair of participants, stored with the
//! smaller id first so each pair maps to exactly one row.

use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set,
};
use uuid::Uuid;

use crate::error::{RepositoryError, is_unique_violation};
use crate::models::chat::{self, ActiveModel as ChatActiveModel, Model as ChatModel};
use crate::models::message::{self, ActiveModel as MessageActiveModel, Model as MessageModel};
use crate::models::{Chat, Message, User};

const MAX_MESSAGE_LEN: usize = 2000;

/// Orders a participant pair the way it is stored
pub fn ordered_pair(a: Uuid, b: Uuid) -> (Uuid, Uuid) {
    if a <= b { (a, b) } else { (b, a) }
}

pub struct ChatRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> ChatRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    /// Return the chat between two users, creating it on first use
    pub async fn open(&self, user_id: Uuid, other_id: Uuid) -> Result<ChatModel, RepositoryError> {
        if user_id == other_id {
            return Err(RepositoryError::validation("cannot open a chat with yourself"));
        }

        User::find_by_id(other_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("USER_NOT_FOUND", "user not found"))?;

        let (user_a_id, user_b_id) = ordered_pair(user_id, other_id);
        if let Some(existing) = self.find_pair(user_a_id, user_b_id).await? {
            return Ok(existing);
        }

        let chat = ChatActiveModel {
            id: Set(Uuid::new_v4()),
            user_a_id: Set(user_a_id),
            user_b_id: Set(user_b_id),
            created_at: Set(Utc::now().into()),
        };

        match chat.insert(self.db).await {
            Ok(chat) => Ok(chat),
            // Opened concurrently by the other participant
            Err(err) if is_unique_violation(&err) => self
                .find_pair(user_a_id, user_b_id)
                .await?
                .ok_or_else(|| RepositoryError::Database(err)),
            Err(err) => Err(err.into()),
        }
    }

    pub async fn get(&self, chat_id: Uuid) -> Result<ChatModel, RepositoryError> {
        Chat::find_by_id(chat_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("CHAT_NOT_FOUND", "chat not found"))
    }

    pub async fn list_for_user(&self, user_id: Uuid) -> Result<Vec<ChatModel>, RepositoryError> {
        Ok(Chat::find()
            .filter(
                Condition::any()
                    .add(chat::Column::UserAId.eq(user_id))
                    .add(chat::Column::UserBId.eq(user_id)),
            )
            .order_by_desc(chat::Column::CreatedAt)
            .all(self.db)
            .await?)
    }

    pub async fn send(
        &self,
        chat_id: Uuid,
        sender_id: Uuid,
        content: &str,
    ) -> Result<MessageModel, RepositoryError> {
        let content = content.trim();
        if content.is_empty() {
            return Err(RepositoryError::validation("message cannot be empty"));
        }
        if content.chars().count() > MAX_MESSAGE_LEN {
            return Err(RepositoryError::validation(format!(
                "message cannot exceed {MAX_MESSAGE_LEN} characters"
            )));
        }

        let message = MessageActiveModel {
            id: Set(Uuid::new_v4()),
            chat_id: Set(chat_id),
            sender_id: Set(sender_id),
            content: Set(content.to_string()),
            created_at: Set(Utc::now().into()),
        };

        Ok(message.insert(self.db).await?)
    }

    pub async fn messages(&self, chat_id: Uuid) -> Result<Vec<MessageModel>, RepositoryError> {
        Ok(Message::find()
            .filter(message::Column::ChatId.eq(chat_id))
            .order_by_asc(message::Column::CreatedAt)
            .order_by_asc(message::Column::Id)
            .all(self.db)
            .await?)
    }

    async fn find_pair(
        &self,
        user_a_id: Uuid,
        user_b_id: Uuid,
    ) -> Result<Option<ChatModel>, RepositoryError> {
        Ok(Chat::find()
            .filter(chat::Column::UserAId.eq(user_a_id))
            .filter(chat::Column::UserBId.eq(user_b_id))
            .one(self.db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordered_pair_is_symmetric() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(ordered_pair(a, b), ordered_pair(b, a));

        let (first, second) = ordered_pair(a, b);
        assert!(first <= second);
    }
}
