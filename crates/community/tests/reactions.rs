use anyhow::Result;
use uuid::Uuid;

use koinonia_community::{CommentStatus, CommentThreads};
use koinonia_database::mock::MemoryClient;

fn threads() -> CommentThreads<MemoryClient> {
    CommentThreads::new(MemoryClient::new())
}

#[tokio::test]
async fn like_and_dislike_exclude_each_other() -> Result<()> {
    let threads = threads();
    let comment = Uuid::new_v4();
    let user = Uuid::new_v4();

    threads.dislike_comment(comment, user).await?;
    assert_eq!(
        threads.comment_status(comment, user).await?,
        CommentStatus { is_liked: false, is_disliked: true }
    );

    // Liking clears the dislike.
    threads.like_comment(comment, user).await?;
    assert_eq!(
        threads.comment_status(comment, user).await?,
        CommentStatus { is_liked: true, is_disliked: false }
    );

    // Liking again toggles it off entirely.
    threads.like_comment(comment, user).await?;
    assert_eq!(
        threads.comment_status(comment, user).await?,
        CommentStatus { is_liked: false, is_disliked: false }
    );
    Ok(())
}

#[tokio::test]
async fn counts_track_users_per_comment() -> Result<()> {
    let threads = threads();
    let comment = Uuid::new_v4();
    let alice = Uuid::new_v4();
    let bob = Uuid::new_v4();
    let carol = Uuid::new_v4();

    threads.like_comment(comment, alice).await?;
    threads.like_comment(comment, bob).await?;
    threads.dislike_comment(comment, carol).await?;
    assert_eq!(threads.like_count(comment).await?, 2);
    assert_eq!(threads.dislike_count(comment).await?, 1);

    // Bob switches sides: his like moves over.
    threads.dislike_comment(comment, bob).await?;
    assert_eq!(threads.like_count(comment).await?, 1);
    assert_eq!(threads.dislike_count(comment).await?, 2);
    Ok(())
}

#[tokio::test]
async fn reactions_are_scoped_per_comment() -> Result<()> {
    let threads = threads();
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();
    let user = Uuid::new_v4();

    threads.like_comment(first, user).await?;
    threads.dislike_comment(second, user).await?;

    assert_eq!(
        threads.comment_status(first, user).await?,
        CommentStatus { is_liked: true, is_disliked: false }
    );
    assert_eq!(
        threads.comment_status(second, user).await?,
        CommentStatus { is_liked: false, is_disliked: true }
    );
    assert_eq!(threads.like_count(first).await?, 1);
    assert_eq!(threads.dislike_count(first).await?, 0);
    Ok(())
}

#[tokio::test]
async fn fresh_comment_has_no_reactions() -> Result<()> {
    let threads = threads();
    let comment = Uuid::new_v4();
    let user = Uuid::new_v4();

    assert_eq!(
        threads.comment_status(comment, user).await?,
        CommentStatus { is_liked: false, is_disliked: false }
    );
    assert_eq!(threads.like_count(comment).await?, 0);
    assert_eq!(threads.dislike_count(comment).await?, 0);
    Ok(())
}
