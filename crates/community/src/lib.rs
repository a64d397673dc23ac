mod comment;
mod reaction;
mod threads;

#[cfg(feature = "postgres")]
pub mod schema;

pub use comment::{Comment, COMMENTS_TABLE};
pub use reaction::{CommentStatus, Reaction, DISLIKED_TABLE, LIKED_TABLE};
pub use threads::{CommentThreads, DEFAULT_COMMENT_PAGE_SIZE};
