//! Vote repository for database operations

use common::error::is_unique_violation;
use sqlx::{PgPool, Row};
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::Target,
    repositories::target_author,
    votes::{Tally, VoteOutcome, VoteValue, decide},
};

/// Vote repository for database operations
#[derive(Clone)]
pub struct VoteRepository {
    pool: PgPool,
}

impl VoteRepository {
    /// Create a new vote repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply a voter's cast to a target and return the new counters
    ///
    /// The target row stays locked until the vote row and the counters are
    /// both written, so casts on one target are serialized.
    pub async fn cast(
        &self,
        voter_id: Uuid,
        target: Target,
        value: VoteValue,
    ) -> ApiResult<(VoteOutcome, Tally)> {
        let mut tx = self.pool.begin().await?;

        if target_author(&mut *tx, target, true).await?.is_none() {
            return Err(ApiError::not_found(target.kind.label()));
        }

        let existing: Option<i16> = sqlx::query_scalar(
            r#"
            SELECT value FROM votes
            WHERE user_id = $1 AND target_kind = $2 AND target_id = $3
            FOR UPDATE
            "#,
        )
        .bind(voter_id)
        .bind(target.kind.as_str())
        .bind(target.id)
        .fetch_optional(&mut *tx)
        .await?;

        let existing = existing
            .map(|v| VoteValue::try_from(i64::from(v)))
            .transpose()
            .map_err(|_| anyhow::anyhow!("Stored vote by {} has an invalid value", voter_id))?;

        let outcome = decide(existing, value);

        match outcome {
            VoteOutcome::Cast(value) => {
                let inserted = sqlx::query(
                    r#"
                    INSERT INTO votes (user_id, target_kind, target_id, value)
                    VALUES ($1, $2, $3, $4)
                    "#,
                )
                .bind(voter_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .bind(value.as_i16())
                .execute(&mut *tx)
                .await;

                match inserted {
                    Ok(_) => {}
                    Err(e) if is_unique_violation(&e) => {
                        return Err(ApiError::Conflict(format!(
                            "You have already voted on this {}",
                            target.kind
                        )));
                    }
                    Err(e) => return Err(e.into()),
                }
            }
            VoteOutcome::Withdrawn(_) => {
                sqlx::query(
                    "DELETE FROM votes WHERE user_id = $1 AND target_kind = $2 AND target_id = $3",
                )
                .bind(voter_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .execute(&mut *tx)
                .await?;
            }
            VoteOutcome::Switched { to, .. } => {
                sqlx::query(
                    r#"
                    UPDATE votes SET value = $4, updated_at = NOW()
                    WHERE user_id = $1 AND target_kind = $2 AND target_id = $3
                    "#,
                )
                .bind(voter_id)
                .bind(target.kind.as_str())
                .bind(target.id)
                .bind(to.as_i16())
                .execute(&mut *tx)
                .await?;
            }
        }

        let delta = outcome.delta();
        let sql = format!(
            r#"
            UPDATE {}
            SET upvotes = upvotes + $2, downvotes = downvotes + $3
            WHERE id = $1
            RETURNING upvotes, downvotes
            "#,
            target.kind.table()
        );
        let row = sqlx::query(&sql)
            .bind(target.id)
            .bind(delta.upvotes)
            .bind(delta.downvotes)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        let tally = Tally {
            upvotes: row.try_get("upvotes")?,
            downvotes: row.try_get("downvotes")?,
        };

        info!(
            "Vote by {} on {} {}: {:?}, rating now {}",
            voter_id,
            target.kind,
            target.id,
            outcome,
            tally.rating()
        );

        Ok((outcome, tally))
    }

    /// Current counters of a target
    pub async fn tally(&self, target: Target) -> ApiResult<Tally> {
        let sql = format!(
            "SELECT upvotes, downvotes FROM {} WHERE id = $1",
            target.kind.table()
        );
        let row = sqlx::query(&sql)
            .bind(target.id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| ApiError::not_found(target.kind.label()))?;

        Ok(Tally {
            upvotes: row.try_get("upvotes")?,
            downvotes: row.try_get("downvotes")?,
        })
    }
}
