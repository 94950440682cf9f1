//! Event models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Row, postgres::PgRow};
use uuid::Uuid;

use crate::{models::AuthorSummary, recurrence::RecurringType};

/// Stored event instance
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub city: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub is_online: bool,
    pub is_recurring: bool,
    pub recurring_type: Option<RecurringType>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub author_id: Uuid,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: i32,
    pub comments_count: i32,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Columns selected for [`Event::from_row`]
pub const EVENT_COLUMNS: &str = "id, title, description, image, image_type, city, category, \
     date, time, is_online, is_recurring, recurring_type, recurring_end_date, author_id, \
     upvotes, downvotes, rating, comments_count, views_count, created_at, updated_at";

impl Event {
    pub fn from_row(row: &PgRow) -> Result<Self, sqlx::Error> {
        let recurring_type = row
            .try_get::<Option<String>, _>("recurring_type")?
            .map(|value| value.parse::<RecurringType>())
            .transpose()
            .map_err(|e| sqlx::Error::ColumnDecode {
                index: "recurring_type".to_string(),
                source: Box::new(e),
            })?;

        Ok(Event {
            id: row.try_get("id")?,
            title: row.try_get("title")?,
            description: row.try_get("description")?,
            image: row.try_get("image")?,
            image_type: row.try_get("image_type")?,
            city: row.try_get("city")?,
            category: row.try_get("category")?,
            date: row.try_get("date")?,
            time: row.try_get("time")?,
            is_online: row.try_get("is_online")?,
            is_recurring: row.try_get("is_recurring")?,
            recurring_type,
            recurring_end_date: row.try_get("recurring_end_date")?,
            author_id: row.try_get("author_id")?,
            upvotes: row.try_get("upvotes")?,
            downvotes: row.try_get("downvotes")?,
            rating: row.try_get("rating")?,
            comments_count: row.try_get("comments_count")?,
            views_count: row.try_get("views_count")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

/// Event together with its author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventWithAuthor {
    #[serde(flatten)]
    pub event: Event,
    pub author: Option<AuthorSummary>,
}

/// Fields of one instance to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewEvent {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub city: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub is_online: bool,
    pub is_recurring: bool,
    pub recurring_type: Option<RecurringType>,
    pub recurring_end_date: Option<DateTime<Utc>>,
    pub author_id: Uuid,
}

/// Request body for `POST /events`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateEventRequest {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub city: String,
    pub category: String,
    /// RFC 3339 timestamp, `YYYY-MM-DDTHH:MM` or `YYYY-MM-DD`
    pub date: String,
    pub time: Option<String>,
    pub is_online: bool,
    pub is_recurring: bool,
    pub recurring_type: Option<String>,
    pub recurring_end_date: Option<String>,
}

/// Request body for `PUT /events/:id`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateEventRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub time: Option<String>,
    pub is_online: Option<bool>,
    pub image: Option<String>,
    pub image_type: Option<String>,
}

/// Query parameters for event listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub search: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

/// Response for `POST /events`
#[derive(Debug, Clone, Serialize)]
pub struct CreatedEvents {
    pub events: Vec<Event>,
    pub created: usize,
}
