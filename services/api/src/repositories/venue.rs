//! Venue repository for database operations

use anyhow::Result;
use common::error::is_unique_violation;
use sqlx::{PgPool, Postgres, QueryBuilder};
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::{
        PageRequest, TargetKind,
        venue::{NewVenue, VENUE_COLUMNS, Venue, VenueQuery, VenueWithAuthor},
    },
    repositories::{author_from_row, non_blank},
    slug::{next_free_slug, slug_family_prefix, venue_base_slug},
};

/// Venue repository for database operations
#[derive(Clone)]
pub struct VenueRepository {
    pool: PgPool,
}

impl VenueRepository {
    /// Create a new venue repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, query: &VenueQuery) {
        builder.push(" WHERE TRUE");

        if let Some(city) = non_blank(&query.city) {
            builder.push(" AND v.city = ").push_bind(city.to_string());
        }

        if let Some(category) = non_blank(&query.category) {
            builder.push(" AND v.category = ").push_bind(category.to_string());
        }
    }

    /// Venues matching the filters in the requested order, with the total count
    pub async fn list(
        &self,
        query: &VenueQuery,
        page: PageRequest,
    ) -> Result<(Vec<VenueWithAuthor>, i64)> {
        let mut builder = QueryBuilder::<Postgres>::new(
            "SELECT v.*, u.name AS author_name, u.email AS author_email \
             FROM venues v LEFT JOIN users u ON u.id = v.author_id",
        );
        Self::push_filters(&mut builder, query);
        builder
            .push(" ORDER BY ")
            .push(query.sort.unwrap_or_default().order_by())
            .push(" LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder.build().fetch_all(&self.pool).await?;

        let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM venues v");
        Self::push_filters(&mut count, query);
        let total: i64 = count.build_query_scalar::<i64>().fetch_one(&self.pool).await?;

        let venues = rows
            .iter()
            .map(|row| {
                let venue: Venue = sqlx::FromRow::from_row(row)?;
                let author = author_from_row(row, venue.author_id)?;
                Ok(VenueWithAuthor { venue, author })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()?;

        Ok((venues, total))
    }

    /// Find a venue by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Venue>> {
        let sql = format!("SELECT {} FROM venues WHERE id = $1", VENUE_COLUMNS);
        let venue = sqlx::query_as::<_, Venue>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(venue)
    }

    /// Count a view and return the venue with its author
    pub async fn record_view(&self, id: Uuid) -> Result<Option<VenueWithAuthor>> {
        let row = sqlx::query(
            r#"
            WITH v AS (
                UPDATE venues SET views_count = views_count + 1
                WHERE id = $1
                RETURNING *
            )
            SELECT v.*, u.name AS author_name, u.email AS author_email
            FROM v LEFT JOIN users u ON u.id = v.author_id
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => {
                let venue: Venue = sqlx::FromRow::from_row(&row)?;
                let author = author_from_row(&row, venue.author_id)?;
                Ok(Some(VenueWithAuthor { venue, author }))
            }
            None => Ok(None),
        }
    }

    /// Insert a venue under the first free slug in its city
    pub async fn create(&self, new_venue: &NewVenue) -> ApiResult<Venue> {
        let base = venue_base_slug(&new_venue.name);

        let mut tx = self.pool.begin().await?;

        let taken: HashSet<String> = sqlx::query_scalar::<_, String>(
            r#"
            SELECT slug FROM venues
            WHERE city = $1 AND slug LIKE $2 || '%'
            "#,
        )
        .bind(&new_venue.city)
        .bind(slug_family_prefix(&base))
        .fetch_all(&mut *tx)
        .await?
        .into_iter()
        .collect();

        let slug = next_free_slug(&base, &taken);

        let sql = format!(
            r#"
            INSERT INTO venues (name, slug, description, images, image_types, address, city,
                                category, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            VENUE_COLUMNS
        );

        let result = sqlx::query_as::<_, Venue>(&sql)
            .bind(&new_venue.name)
            .bind(&slug)
            .bind(&new_venue.description)
            .bind(&new_venue.images)
            .bind(&new_venue.image_types)
            .bind(&new_venue.address)
            .bind(&new_venue.city)
            .bind(&new_venue.category)
            .bind(new_venue.author_id)
            .fetch_one(&mut *tx)
            .await;

        let venue = match result {
            Ok(venue) => venue,
            Err(e) if is_unique_violation(&e) => {
                return Err(ApiError::Conflict(format!(
                    "A venue with slug {} already exists in {}",
                    slug, new_venue.city
                )));
            }
            Err(e) => return Err(e.into()),
        };

        tx.commit().await?;

        info!("Created venue {} ({})", venue.id, venue.slug);

        Ok(venue)
    }

    /// Write the editable fields of `venue`
    pub async fn update(&self, venue: &Venue) -> Result<Venue> {
        let sql = format!(
            r#"
            UPDATE venues
            SET name = $2, description = $3, images = $4, image_types = $5, address = $6,
                category = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            VENUE_COLUMNS
        );

        let venue = sqlx::query_as::<_, Venue>(&sql)
            .bind(venue.id)
            .bind(&venue.name)
            .bind(&venue.description)
            .bind(&venue.images)
            .bind(&venue.image_types)
            .bind(&venue.address)
            .bind(&venue.category)
            .fetch_one(&self.pool)
            .await?;

        info!("Updated venue {}", venue.id);

        Ok(venue)
    }

    /// Delete a venue with its messages and votes
    pub async fn delete_cascade(&self, id: Uuid) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        for table in ["messages", "votes"] {
            let sql = format!(
                "DELETE FROM {} WHERE target_kind = $1 AND target_id = $2",
                table
            );
            sqlx::query(&sql)
                .bind(TargetKind::Venue.as_str())
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        let deleted = sqlx::query("DELETE FROM venues WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        info!("Deleted venue {}", id);

        Ok(deleted.rows_affected() > 0)
    }
}
