//! DDL for the community tables, applied by the owning service at startup.

use koinonia_database::{PostgresClient, StorageError};

pub const CREATE_COMMENTS_SQL: &str = r#"CREATE TABLE IF NOT EXISTS "comment_data" (
    "id" UUID PRIMARY KEY,
    "comment_content" TEXT NOT NULL,
    "user_id" UUID NOT NULL,
    "entity_id" UUID,
    "parent_id" UUID,
    "reply_count" BIGINT NOT NULL,
    "edited" BOOLEAN NOT NULL,
    "created_at" BIGINT NOT NULL,
    "updated_at" BIGINT NOT NULL
)"#;

pub const CREATE_LIKED_SQL: &str = r#"CREATE TABLE IF NOT EXISTS "liked" (
    "id" UUID PRIMARY KEY,
    "target_comment_id" UUID NOT NULL,
    "user_id" UUID NOT NULL,
    "created_at" BIGINT NOT NULL
)"#;

pub const CREATE_DISLIKED_SQL: &str = r#"CREATE TABLE IF NOT EXISTS "disliked" (
    "id" UUID PRIMARY KEY,
    "target_comment_id" UUID NOT NULL,
    "user_id" UUID NOT NULL,
    "created_at" BIGINT NOT NULL
)"#;

pub const INDEXES_SQL: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_comment_data_entity_id ON \"comment_data\" (\"entity_id\")",
    "CREATE INDEX IF NOT EXISTS idx_comment_data_parent_id ON \"comment_data\" (\"parent_id\")",
    "CREATE INDEX IF NOT EXISTS idx_liked_target_user ON \"liked\" (\"target_comment_id\", \"user_id\")",
    "CREATE INDEX IF NOT EXISTS idx_disliked_target_user ON \"disliked\" (\"target_comment_id\", \"user_id\")",
];

pub async fn ensure_tables(client: &PostgresClient) -> Result<(), StorageError> {
    client.execute_ddl(CREATE_COMMENTS_SQL).await?;
    client.execute_ddl(CREATE_LIKED_SQL).await?;
    client.execute_ddl(CREATE_DISLIKED_SQL).await?;
    for sql in INDEXES_SQL {
        client.execute_ddl(sql).await?;
    }
    Ok(())
}
