use serde::{Deserialize, Serialize};
use uuid::Uuid;

use koinonia_common::get_current_timestamp;

/// Resource holding the whole comment tree, top-level comments and replies
/// alike.
pub const COMMENTS_TABLE: &str = "comment_data";

/// A comment row. Exactly one of `entity_id`/`parent_id` is set: top-level
/// comments point at the subject they discuss (an announcement, a meeting),
/// replies point at their parent comment. `reply_count` is a denormalized
/// count of *direct* children only, maintained by
/// [`CommentThreads`](crate::CommentThreads).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub comment_content: String,
    pub user_id: Uuid,
    pub entity_id: Option<Uuid>,
    pub parent_id: Option<Uuid>,
    pub reply_count: i64,
    pub edited: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Comment {
    pub fn top_level(entity_id: Uuid, user_id: Uuid, content: &str) -> Self {
        let now = get_current_timestamp();
        Self {
            id: Uuid::new_v4(),
            comment_content: content.to_string(),
            user_id,
            entity_id: Some(entity_id),
            parent_id: None,
            reply_count: 0,
            edited: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reply(parent_id: Uuid, user_id: Uuid, content: &str) -> Self {
        let now = get_current_timestamp();
        Self {
            id: Uuid::new_v4(),
            comment_content: content.to_string(),
            user_id,
            entity_id: None,
            parent_id: Some(parent_id),
            reply_count: 0,
            edited: false,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}
