//! Event repository for database operations

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use tracing::info;
use uuid::Uuid;

use crate::{
    events::EventStore,
    models::{
        PageRequest, TargetKind,
        event::{EVENT_COLUMNS, Event, EventQuery, EventWithAuthor, NewEvent},
    },
    repositories::{author_from_row, like_pattern, non_blank},
};

/// Event repository for database operations
#[derive(Clone)]
pub struct EventRepository {
    pool: PgPool,
}

impl EventRepository {
    /// Create a new event repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(
        builder: &mut QueryBuilder<'_, Postgres>,
        query: &EventQuery,
        now: DateTime<Utc>,
    ) {
        builder.push(" WHERE e.date > ").push_bind(now);

        if let Some(city) = non_blank(&query.city) {
            builder.push(" AND e.city = ").push_bind(city.to_string());
        }

        if let Some(category) = non_blank(&query.category) {
            builder.push(" AND e.category = ").push_bind(category.to_string());
        }

        if let Some(search) = non_blank(&query.search) {
            let pattern = like_pattern(search);
            builder
                .push(" AND (e.title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR e.description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }
    }

    /// Upcoming events matching the filters, soonest first, with the total count
    pub async fn list(
        &self,
        query: &EventQuery,
        page: PageRequest,
        now: DateTime<Utc>,
    ) -> Result<(Vec<EventWithAuthor>, i64)> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT e.*, u.name AS author_name, u.email AS author_email \
             FROM events e LEFT JOIN users u ON u.id = e.author_id",
        );
        Self::push_filters(&mut builder, query, now);
        builder
            .push(" ORDER BY e.date ASC LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM events e");
        Self::push_filters(&mut count, query, now);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let events = rows
            .iter()
            .map(|row| {
                let event = Event::from_row(row)?;
                let author = author_from_row(row, event.author_id)?;
                Ok(EventWithAuthor { event, author })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok((events, total))
    }

    /// Find an event by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Event>> {
        let sql = format!("SELECT {} FROM events WHERE id = $1", EVENT_COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(Event::from_row).transpose()?)
    }

    /// Count a view and return the event with its author
    pub async fn record_view(&self, id: Uuid) -> Result<Option<EventWithAuthor>> {
        let row = sqlx::query(
            r#"
            WITH e AS (
                UPDATE events SET views_count = views_count + 1
                WHERE id = $1
                RETURNING *
            )
            SELECT e.*, u.name AS author_name, u.email AS author_email
            FROM e LEFT JOIN users u ON u.id = e.author_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let event = Event::from_row(&row)?;
                let author = author_from_row(&row, event.author_id)?;
                Ok(Some(EventWithAuthor { event, author }))
            }
            None => Ok(None),
        }
    }

    /// Write the editable fields of `event`
    pub async fn update(&self, event: &Event) -> Result<Event> {
        let sql = format!(
            r#"
            UPDATE events
            SET title = $2, description = $3, category = $4, time = $5, is_online = $6,
                image = $7, image_type = $8, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(event.id)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.category)
            .bind(&event.time)
            .bind(event.is_online)
            .bind(&event.image)
            .bind(&event.image_type)
            .fetch_one(&self.pool)
            .await?;

        info!("Updated event {}", event.id);

        Ok(Event::from_row(&row)?)
    }

    /// Delete an event with its messages and votes
    pub async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let messages =
            sqlx::query("DELETE FROM messages WHERE target_kind = $1 AND target_id = $2")
                .bind(TargetKind::Event.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM votes WHERE target_kind = $1 AND target_id = $2")
            .bind(TargetKind::Event.as_str())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!(
            "Deleted event {} with {} messages",
            id,
            messages.rows_affected()
        );

        Ok(deleted.rows_affected() > 0)
    }
}

#[async_trait]
impl EventStore for EventRepository {
    async fn count_future_by_author(&self, author_id: Uuid, now: DateTime<Utc>) -> Result<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE author_id = $1 AND date > $2")
                .bind(author_id)
                .bind(now)
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    async fn insert(&self, event: &NewEvent) -> Result<Event> {
        let sql = format!(
            r#"
            INSERT INTO events (title, description, image, image_type, city, category, date,
                                time, is_online, is_recurring, recurring_type,
                                recurring_end_date, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {}
            "#,
            EVENT_COLUMNS
        );

        let row = sqlx::query(&sql)
            .bind(&event.title)
            .bind(&event.description)
            .bind(&event.image)
            .bind(&event.image_type)
            .bind(&event.city)
            .bind(&event.category)
            .bind(event.date)
            .bind(&event.time)
            .bind(event.is_online)
            .bind(event.is_recurring)
            .bind(event.recurring_type.map(|kind| kind.as_str()))
            .bind(event.recurring_end_date)
            .bind(event.author_id)
            .fetch_one(&self.pool)
            .await?;

        let event = Event::from_row(&row)?;
        info!("Inserted event {} on {}", event.id, event.date);

        Ok(event)
    }

    async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM events WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
