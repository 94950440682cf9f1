//! Message repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{PageRequest, Target, message::Message},
    repositories::target_author,
};

/// Message repository for database operations
#[derive(Clone)]
pub struct MessageRepository {
    pool: PgPool,
}

impl MessageRepository {
    /// Create a new message repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Author of the target, or `None` when the target does not exist
    pub async fn target_author(&self, target: Target) -> Result<Option<Uuid>> {
        let mut conn = self.pool.acquire().await?;
        Ok(target_author(&mut conn, target, false).await?)
    }

    /// One page of a target's messages counted from the newest, returned oldest first
    pub async fn list(&self, target: Target, page: PageRequest) -> Result<(Vec<Message>, i64)> {
        let mut messages = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, target_id, user_id, username, content, created_at
            FROM messages
            WHERE target_kind = $1 AND target_id = $2
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        messages.reverse();

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM messages WHERE target_kind = $1 AND target_id = $2",
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_one(&self.pool)
        .await?;

        Ok((messages, total))
    }

    /// Post a message and bump the target's comment count
    pub async fn create(
        &self,
        target: Target,
        user_id: Uuid,
        username: &str,
        content: &str,
    ) -> ApiResult<Message> {
        let mut tx = self.pool.begin().await?;

        if target_author(&mut *tx, target, true).await?.is_none() {
            return Err(ApiError::not_found(target.kind.label()));
        }

        let message = sqlx::query_as::<_, Message>(
            r#"
            INSERT INTO messages (target_kind, target_id, user_id, username, content)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, target_id, user_id, username, content, created_at
            "#,
        )
        .bind(target.kind.as_str())
        .bind(target.id)
        .bind(user_id)
        .bind(username)
        .bind(content)
        .fetch_one(&mut *tx)
        .await?;

        let sql = format!(
            "UPDATE {} SET comments_count = comments_count + 1 WHERE id = $1",
            target.kind.table()
        );
        sqlx::query(&sql).bind(target.id).execute(&mut *tx).await?;

        tx.commit().await?;

        info!(
            "User {} posted message {} on {} {}",
            user_id, message.id, target.kind, target.id
        );

        Ok(message)
    }

    /// Find a message posted on `target`
    pub async fn find_on_target(&self, target: Target, id: Uuid) -> Result<Option<Message>> {
        let message = sqlx::query_as::<_, Message>(
            r#"
            SELECT id, target_id, user_id, username, content, created_at
            FROM messages
            WHERE id = $1 AND target_kind = $2 AND target_id = $3
            "#,
        )
        .bind(id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(message)
    }

    /// Delete a message and lower the target's comment count
    pub async fn delete(&self, target: Target, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let deleted = sqlx::query(
            "DELETE FROM messages WHERE id = $1 AND target_kind = $2 AND target_id = $3",
        )
        .bind(id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .execute(&mut *tx)
        .await?;

        if deleted.rows_affected() > 0 {
            let sql = format!(
                "UPDATE {} SET comments_count = GREATEST(comments_count - 1, 0) WHERE id = $1",
                target.kind.table()
            );
            sqlx::query(&sql).bind(target.id).execute(&mut *tx).await?;
        }

        tx.commit().await?;

        info!("Deleted message {} on {} {}", id, target.kind, target.id);

        Ok(deleted.rows_affected() > 0)
    }
}
