//! Like/dislike reactions. Two disjoint tables, one row per `(comment,
//! user)` pair; mutual exclusion between them is procedural (remove the
//! opposite reaction, then toggle the requested one), not a schema
//! constraint.

use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use koinonia_common::get_current_timestamp;
use koinonia_database::{StorageError, TableClient, TableQuery};

use crate::threads::{decode, CommentThreads};

pub const LIKED_TABLE: &str = "liked";
pub const DISLIKED_TABLE: &str = "disliked";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reaction {
    pub id: Uuid,
    pub target_comment_id: Uuid,
    pub user_id: Uuid,
    pub created_at: i64,
}

impl Reaction {
    pub fn new(target_comment_id: Uuid, user_id: Uuid) -> Self {
        Self {
            id: Uuid::new_v4(),
            target_comment_id,
            user_id,
            created_at: get_current_timestamp(),
        }
    }
}

/// Per-user reaction state for one comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentStatus {
    pub is_liked: bool,
    pub is_disliked: bool,
}

impl<C: TableClient> CommentThreads<C> {
    /// Row id of the `(comment, user)` reaction in `table`, if any.
    async fn reaction_row(
        &self,
        table: &str,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Uuid>, StorageError> {
        let query = TableQuery::new()
            .eq("target_comment_id", json!(comment_id))
            .eq("user_id", json!(user_id));
        let rows = self.client().fetch(table, &query).await?;
        match rows.into_iter().next() {
            None => Ok(None),
            Some(row) => {
                let reaction: Reaction = decode(table, row)?;
                Ok(Some(reaction.id))
            }
        }
    }

    async fn toggle_reaction(
        &self,
        table: &str,
        opposite: &str,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<(), StorageError> {
        if let Some(row_id) = self.reaction_row(opposite, comment_id, user_id).await? {
            self.client().delete(opposite, "id", json!(row_id)).await?;
        }
        match self.reaction_row(table, comment_id, user_id).await? {
            Some(row_id) => {
                self.client().delete(table, "id", json!(row_id)).await?;
            }
            None => {
                let reaction = Reaction::new(comment_id, user_id);
                self.client().insert(table, json!(reaction)).await?;
            }
        }
        Ok(())
    }

    /// Likes the comment, clearing any dislike by the same user first; a
    /// second call from the same user un-likes it.
    pub async fn like_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<(), StorageError> {
        self.toggle_reaction(LIKED_TABLE, DISLIKED_TABLE, comment_id, user_id).await
    }

    /// Mirror of [`like_comment`](Self::like_comment) with the roles
    /// reversed.
    pub async fn dislike_comment(&self, comment_id: Uuid, user_id: Uuid) -> Result<(), StorageError> {
        self.toggle_reaction(DISLIKED_TABLE, LIKED_TABLE, comment_id, user_id).await
    }

    pub async fn comment_status(
        &self,
        comment_id: Uuid,
        user_id: Uuid,
    ) -> Result<CommentStatus, StorageError> {
        let is_liked = self.reaction_row(LIKED_TABLE, comment_id, user_id).await?.is_some();
        let is_disliked = self.reaction_row(DISLIKED_TABLE, comment_id, user_id).await?.is_some();
        Ok(CommentStatus { is_liked, is_disliked })
    }

    pub async fn like_count(&self, comment_id: Uuid) -> Result<u64, StorageError> {
        let query = TableQuery::new().eq("target_comment_id", json!(comment_id));
        self.client().count(LIKED_TABLE, &query).await
    }

    pub async fn dislike_count(&self, comment_id: Uuid) -> Result<u64, StorageError> {
        let query = TableQuery::new().eq("target_comment_id", json!(comment_id));
        self.client().count(DISLIKED_TABLE, &query).await
    }
}
