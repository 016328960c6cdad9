//! # Social Feed Repository
//!
//! Posts are read newest first with keyset pagination on `(created_at, id)`;
//! feedbacks (comments) on a post are read oldest first.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use uuid::Uuid;

use crate::cursor::FeedCursor;
use crate::error::RepositoryError;
use crate::models::feedback::{self, ActiveModel as FeedbackActiveModel, Model as FeedbackModel};
use crate::models::post::{self, ActiveModel as PostActiveModel, Model as PostModel};
use crate::models::{Feedback, Post};

const MAX_CONTENT_LEN: usize = 5000;

/// One page of the feed
#[derive(Debug, Clone)]
pub struct FeedPage {
    pub posts: Vec<PostModel>,
    /// Position of the last post, present only when more posts follow
    pub next: Option<FeedCursor>,
}

pub struct PostRepository<'a> {
    db: &'a DatabaseConnection,
}

impl<'a> PostRepository<'a> {
    pub fn new(db: &'a DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn create(
        &self,
        author_id: Uuid,
        content: &str,
    ) -> Result<PostModel, RepositoryError> {
        let post = PostActiveModel {
            id: Set(Uuid::new_v4()),
            author_id: Set(author_id),
            content: Set(validate_content(content)?),
            created_at: Set(Utc::now().into()),
        };

        Ok(post.insert(self.db).await?)
    }

    pub async fn get(&self, post_id: Uuid) -> Result<PostModel, RepositoryError> {
        Post::find_by_id(post_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("POST_NOT_FOUND", "post not found"))
    }

    /// Fetch up to `limit` posts strictly older than `after`
    pub async fn feed(
        &self,
        after: Option<FeedCursor>,
        limit: u64,
    ) -> Result<FeedPage, RepositoryError> {
        let mut query = Post::find();

        if let Some(cursor) = after {
            let created_at: DateTime<FixedOffset> = cursor.created_at.into();
            query = query.filter(
                Condition::any()
                    .add(post::Column::CreatedAt.lt(created_at))
                    .add(
                        Condition::all()
                            .add(post::Column::CreatedAt.eq(created_at))
                            .add(post::Column::Id.lt(cursor.id)),
                    ),
            );
        }

        // One extra row tells whether another page exists
        let mut posts = query
            .order_by_desc(post::Column::CreatedAt)
            .order_by_desc(post::Column::Id)
            .limit(limit + 1)
            .all(self.db)
            .await?;

        let has_more = posts.len() as u64 > limit;
        posts.truncate(limit as usize);

        let next = if has_more {
            posts
                .last()
                .map(|last| FeedCursor::new(last.created_at.with_timezone(&Utc), last.id))
        } else {
            None
        };

        Ok(FeedPage { posts, next })
    }

    pub async fn delete(&self, post_id: Uuid) -> Result<(), RepositoryError> {
        let post = self.get(post_id).await?;
        Post::delete_by_id(post.id).exec(self.db).await?;
        Ok(())
    }

    pub async fn add_feedback(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        content: &str,
    ) -> Result<FeedbackModel, RepositoryError> {
        let content = validate_content(content)?;
        let post = self.get(post_id).await?;

        let feedback = FeedbackActiveModel {
            id: Set(Uuid::new_v4()),
            post_id: Set(post.id),
            author_id: Set(author_id),
            content: Set(content),
            created_at: Set(Utc::now().into()),
        };

        Ok(feedback.insert(self.db).await?)
    }

    pub async fn list_feedbacks(
        &self,
        post_id: Uuid,
    ) -> Result<Vec<FeedbackModel>, RepositoryError> {
        let post = self.get(post_id).await?;

        Ok(Feedback::find()
            .filter(feedback::Column::PostId.eq(post.id))
            .order_by_asc(feedback::Column::CreatedAt)
            .order_by_asc(feedback::Column::Id)
            .all(self.db)
            .await?)
    }

    pub async fn get_feedback(&self, feedback_id: Uuid) -> Result<FeedbackModel, RepositoryError> {
        Feedback::find_by_id(feedback_id)
            .one(self.db)
            .await?
            .ok_or_else(|| RepositoryError::not_found("FEEDBACK_NOT_FOUND", "feedback not found"))
    }

    pub async fn delete_feedback(&self, feedback_id: Uuid) -> Result<(), RepositoryError> {
        let feedback = self.get_feedback(feedback_id).await?;
        Feedback::delete_by_id(feedback.id).exec(self.db).await?;
        Ok(())
    }
}

fn validate_content(content: &str) -> Result<String, RepositoryError> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        return Err(RepositoryError::validation("content cannot be empty"));
    }
    if trimmed.chars().count() > MAX_CONTENT_LEN {
        return Err(RepositoryError::validation(format!(
            "content cannot exceed {MAX_CONTENT_LEN} characters"
        )));
    }
    Ok(trimmed.to_string())
}
