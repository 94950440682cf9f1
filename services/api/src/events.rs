//! Event creation with recurrence expansion and the upcoming-event cap
//!
//! Every author may have at most `cap` events dated after "now". A recurring
//! request is expanded up front, and the base instance plus every generated
//! instance counts toward the cap. A request that would overflow is rejected
//! before anything is written. If an insert fails midway, instances already
//! written for the request are deleted again.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::clock::Clock;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::event::{CreateEventRequest, Event, NewEvent},
    recurrence::{RecurrenceRule, RecurringType},
    validation::{
        MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, parse_timestamp, required_text, validate_image,
        validate_time,
    },
};

/// Persistence needed to create events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Number of events by `author_id` dated strictly after `now`
    async fn count_future_by_author(
        &self,
        author_id: Uuid,
        now: DateTime<Utc>,
    ) -> anyhow::Result<i64>;

    /// Insert one instance
    async fn insert(&self, event: &NewEvent) -> anyhow::Result<Event>;

    /// Delete an instance by id
    async fn delete(&self, id: Uuid) -> anyhow::Result<bool>;
}

/// Validated creation request, not yet tied to an author
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: String,
    pub image: Option<String>,
    pub image_type: Option<String>,
    pub city: String,
    pub category: String,
    pub date: DateTime<Utc>,
    pub time: Option<String>,
    pub is_online: bool,
    pub recurrence: Option<RecurrenceRule>,
}

impl EventDraft {
    /// Validate a creation request against the current time
    pub fn from_request(request: CreateEventRequest, now: DateTime<Utc>) -> ApiResult<Self> {
        let title = required_text("Title", &request.title, MAX_TITLE_CHARS)
            .map_err(ApiError::Validation)?;
        let description =
            required_text("Description", &request.description, MAX_DESCRIPTION_CHARS)
                .map_err(ApiError::Validation)?;
        let city = required_text("City", &request.city, 100).map_err(ApiError::Validation)?;
        let category =
            required_text("Category", &request.category, 100).map_err(ApiError::Validation)?;
        let time = validate_time(request.time.as_deref()).map_err(ApiError::Validation)?;
        let (image, image_type) =
            validate_image(request.image.as_deref(), request.image_type.as_deref())
                .map_err(ApiError::Validation)?;

        let date = parse_timestamp("Date", &request.date).map_err(ApiError::Validation)?;
        if date <= now {
            return Err(ApiError::Validation(
                "Event date must be in the future".to_string(),
            ));
        }

        let recurring_type = request
            .recurring_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::parse::<RecurringType>)
            .transpose()
            .map_err(|e| ApiError::Validation(e.to_string()))?;
        let recurring_end_date = request
            .recurring_end_date
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .map(|d| parse_timestamp("Recurring end date", d))
            .transpose()
            .map_err(ApiError::Validation)?;

        let recurrence = RecurrenceRule::from_input(
            request.is_recurring,
            recurring_type,
            recurring_end_date,
            date,
        )
        .map_err(|e| ApiError::Validation(e.to_string()))?;

        Ok(EventDraft {
            title,
            description,
            image,
            image_type,
            city,
            category,
            date,
            time,
            is_online: request.is_online,
            recurrence,
        })
    }

    /// Dates of every instance: the base date first, then generated ones
    ///
    /// At most `limit` dates are produced.
    pub fn instance_dates(&self, limit: usize) -> Vec<DateTime<Utc>> {
        let generated = self
            .recurrence
            .map(|rule| rule.occurrences(self.date))
            .into_iter()
            .flatten();

        std::iter::once(self.date).chain(generated).take(limit).collect()
    }

    fn instance(&self, author_id: Uuid, date: DateTime<Utc>) -> NewEvent {
        NewEvent {
            title: self.title.clone(),
            description: self.description.clone(),
            image: self.image.clone(),
            image_type: self.image_type.clone(),
            city: self.city.clone(),
            category: self.category.clone(),
            date,
            time: self.time.clone(),
            is_online: self.is_online,
            is_recurring: self.recurrence.is_some(),
            recurring_type: self.recurrence.map(|rule| rule.kind),
            recurring_end_date: self.recurrence.map(|rule| rule.end),
            author_id,
        }
    }
}

/// Create the base instance and every generated instance of `draft`
///
/// Returns the created events in date order, base first.
pub async fn create_event_series(
    store: &dyn EventStore,
    clock: &dyn Clock,
    author_id: Uuid,
    draft: &EventDraft,
    cap: usize,
) -> ApiResult<Vec<Event>> {
    let now = clock.now();
    let existing = store.count_future_by_author(author_id, now).await?;
    let existing = usize::try_from(existing).unwrap_or(0);
    let remaining = cap.saturating_sub(existing);

    if remaining == 0 {
        warn!("Author {} already has {} upcoming events", author_id, existing);
        return Err(ApiError::CapacityExceeded(format!(
            "You can have at most {} upcoming events",
            cap
        )));
    }

    // One past the free slots is enough to know the series does not fit.
    let dates = draft.instance_dates(remaining + 1);
    if dates.len() > remaining {
        warn!(
            "Rejected series for author {}: needs more than {} free slots",
            author_id, remaining
        );
        return Err(ApiError::CapacityExceeded(format!(
            "This event would exceed the limit of {} upcoming events ({} free)",
            cap, remaining
        )));
    }

    let mut created: Vec<Event> = Vec::with_capacity(dates.len());
    for date in dates {
        match store.insert(&draft.instance(author_id, date)).await {
            Ok(event) => created.push(event),
            Err(e) => {
                error!(
                    "Failed to insert event at {} for author {}, rolling back {} instances",
                    date,
                    author_id,
                    created.len()
                );
                roll_back(store, &created).await;
                return Err(ApiError::Internal(e));
            }
        }
    }

    info!(
        "Created {} event instances for author {}",
        created.len(),
        author_id
    );

    Ok(created)
}

async fn roll_back(store: &dyn EventStore, created: &[Event]) {
    for event in created {
        if let Err(e) = store.delete(event.id).await {
            error!("Failed to roll back event {}: {:#}", event.id, e);
        }
    }
}
