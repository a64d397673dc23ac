use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use uuid::Uuid;

use koinonia_common::get_current_timestamp;
use koinonia_database::{paginate, ListFilter, OrderDirection, Page, StorageError, TableClient, TableQuery};

use crate::comment::{Comment, COMMENTS_TABLE};

pub const DEFAULT_COMMENT_PAGE_SIZE: i64 = 10;

/// Comment/reply service over an injected [`TableClient`]. Multi-step
/// operations (reply-count maintenance, reaction toggles) are sequences of
/// independent round trips with no transactional wrapping; concurrent calls
/// against the same parent can under- or over-count, which the backend's
/// write semantics do not prevent.
pub struct CommentThreads<C: TableClient> {
    client: C,
    page_size: i64,
}

pub(crate) fn decode<T: DeserializeOwned>(resource: &str, row: Value) -> Result<T, StorageError> {
    serde_json::from_value(row)
        .map_err(|e| StorageError::remote(format!("failed to decode row from \"{resource}\": {e}")))
}

impl<C: TableClient> CommentThreads<C> {
    pub fn new(client: C) -> Self {
        Self { client, page_size: DEFAULT_COMMENT_PAGE_SIZE }
    }

    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Posts a top-level comment against `entity_id`.
    pub async fn add_comment(
        &self,
        entity_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Comment, StorageError> {
        let comment = Comment::top_level(entity_id, user_id, content);
        let payload = json!(comment);
        let stored = self.client.insert(COMMENTS_TABLE, payload).await?;
        decode(COMMENTS_TABLE, stored)
    }

    /// One page of the top-level comments attached to `entity_id`,
    /// newest-first.
    pub async fn fetch_comments(
        &self,
        page: i64,
        entity_id: Uuid,
    ) -> Result<Page<Comment>, StorageError> {
        let filter = ListFilter::new()
            .eq("entity_id", json!(entity_id))
            .order_by("created_at", false);
        paginate(&self.client, COMMENTS_TABLE, page, self.page_size, &filter).await
    }

    pub async fn get_comment(&self, id: Uuid) -> Result<Comment, StorageError> {
        let query = TableQuery::new().eq("id", json!(id));
        let row = self.client.fetch_one(COMMENTS_TABLE, &query).await?;
        decode(COMMENTS_TABLE, row)
    }

    /// Rewrites the content and marks the comment as edited.
    pub async fn update_comment(&self, id: Uuid, content: &str) -> Result<(), StorageError> {
        let patch = json!({
            "comment_content": content,
            "edited": true,
            "updated_at": get_current_timestamp(),
        });
        let touched = self.client.update(COMMENTS_TABLE, patch, "id", json!(id)).await?;
        if touched == 0 {
            return Err(StorageError::not_found(COMMENTS_TABLE));
        }
        Ok(())
    }

    /// Removes a top-level comment. Replies are left in place as orphans and
    /// no counters are adjusted.
    pub async fn delete_comment(&self, id: Uuid) -> Result<(), StorageError> {
        tracing::debug!("[delete_comment] removing comment {id}; replies stay orphaned");
        self.client.delete(COMMENTS_TABLE, "id", json!(id)).await?;
        Ok(())
    }

    /// Posts a reply under `parent_id` and bumps the parent's direct-reply
    /// counter. Two sequential round trips: the insert lands first, then the
    /// parent is re-read (`NotFound` if it vanished in between) and its
    /// counter written back.
    pub async fn add_reply(
        &self,
        parent_id: Uuid,
        user_id: Uuid,
        content: &str,
    ) -> Result<Comment, StorageError> {
        let reply = Comment::reply(parent_id, user_id, content);
        let stored = self.client.insert(COMMENTS_TABLE, json!(reply)).await?;

        let parent = self.get_comment(parent_id).await?;
        let patch = json!({ "reply_count": parent.reply_count + 1 });
        self.client.update(COMMENTS_TABLE, patch, "id", json!(parent_id)).await?;

        decode(COMMENTS_TABLE, stored)
    }

    /// Removes a reply and decrements its parent's counter, clamped at
    /// zero. The counter is written before the row is deleted; a failed
    /// delete after a successful write leaves the counter one low.
    pub async fn delete_reply(&self, id: Uuid) -> Result<(), StorageError> {
        let reply = self.get_comment(id).await?;
        let parent_id = reply.parent_id.ok_or_else(|| {
            StorageError::QueryConstruction(format!("comment {id} is not a reply"))
        })?;

        let parent = self.get_comment(parent_id).await?;
        let patch = json!({ "reply_count": (parent.reply_count - 1).max(0) });
        self.client.update(COMMENTS_TABLE, patch, "id", json!(parent_id)).await?;

        self.client.delete(COMMENTS_TABLE, "id", json!(id)).await?;
        Ok(())
    }

    /// Direct children of `parent_id`, newest-first.
    async fn direct_replies(&self, parent_id: Uuid) -> Result<Vec<Comment>, StorageError> {
        let query = TableQuery::new()
            .eq("parent_id", json!(parent_id))
            .order_by("created_at", OrderDirection::Desc);
        let rows = self.client.fetch(COMMENTS_TABLE, &query).await?;
        rows.into_iter().map(|row| decode(COMMENTS_TABLE, row)).collect()
    }

    /// The full descendant subtree of `comment_id`, flattened depth-first
    /// pre-order: siblings newest-first, each child immediately followed by
    /// its own subtree. One round trip per node, so cost grows with the
    /// thread, not its depth; an explicit worklist keeps deep threads off
    /// the call stack. Parent/child links are assumed acyclic.
    pub async fn fetch_nested_replies(&self, comment_id: Uuid) -> Result<Vec<Comment>, StorageError> {
        let mut flattened = Vec::new();
        let mut worklist = self.direct_replies(comment_id).await?;
        worklist.reverse();
        while let Some(comment) = worklist.pop() {
            let children = self.direct_replies(comment.id).await?;
            flattened.push(comment);
            for child in children.into_iter().rev() {
                worklist.push(child);
            }
        }
        Ok(flattened)
    }
}
