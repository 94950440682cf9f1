//! City repository for database operations

use anyhow::Result;
use common::error::is_unique_violation;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    models::city::City,
    repositories::like_pattern,
};

/// Columns for [`City`]; `events_count` counts upcoming events on read
const CITY_COLUMNS: &str = "c.id, c.name, c.slug, c.image_url, c.created_at, c.updated_at, \
     (SELECT COUNT(*) FROM events e WHERE e.city = c.name AND e.date > NOW())::INT AS events_count";

/// City repository for database operations
#[derive(Clone)]
pub struct CityRepository {
    pool: PgPool,
}

impl CityRepository {
    /// Create a new city repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Cities whose name contains `search`, sorted by name
    pub async fn search(&self, search: Option<&str>, limit: u32) -> Result<Vec<City>> {
        let sql = format!(
            r#"
            SELECT {}
            FROM cities c
            WHERE $1::TEXT IS NULL OR c.name ILIKE $1
            ORDER BY c.name ASC
            LIMIT $2
            "#,
            CITY_COLUMNS
        );

        let cities = sqlx::query_as::<_, City>(&sql)
            .bind(search.map(like_pattern))
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await?;

        Ok(cities)
    }

    /// Find a city by slug
    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<City>> {
        let sql = format!("SELECT {} FROM cities c WHERE c.slug = $1", CITY_COLUMNS);

        let city = sqlx::query_as::<_, City>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(city)
    }

    /// Create a city; a taken name or slug is a conflict
    pub async fn create(&self, name: &str, slug: &str, image_url: &str) -> ApiResult<City> {
        let result = sqlx::query_as::<_, City>(
            r#"
            INSERT INTO cities (name, slug, image_url)
            VALUES ($1, $2, $3)
            RETURNING id, name, slug, image_url, created_at, updated_at, 0 AS events_count
            "#,
        )
        .bind(name)
        .bind(slug)
        .bind(image_url)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(city) => {
                info!("Created city {} ({})", city.name, city.slug);
                Ok(city)
            }
            Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
                "A city with this name already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Rename a city or change its image; a taken name or slug is a conflict
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        slug: &str,
        image_url: &str,
    ) -> ApiResult<Option<City>> {
        let sql = format!(
            r#"
            WITH c AS (
                UPDATE cities
                SET name = $2, slug = $3, image_url = $4, updated_at = NOW()
                WHERE id = $1
                RETURNING *
            )
            SELECT {} FROM c
            "#,
            CITY_COLUMNS
        );

        let result = sqlx::query_as::<_, City>(&sql)
            .bind(id)
            .bind(name)
            .bind(slug)
            .bind(image_url)
            .fetch_optional(&self.pool)
            .await;

        match result {
            Ok(city) => {
                if let Some(city) = &city {
                    info!("Updated city {} ({})", city.name, city.slug);
                }
                Ok(city)
            }
            Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
                "A city with this name already exists".to_string(),
            )),
            Err(e) => Err(e.into()),
        }
    }

    /// Delete a city by slug, returning it if it existed
    pub async fn delete(&self, slug: &str) -> Result<Option<City>> {
        let sql = format!(
            r#"
            WITH c AS (
                DELETE FROM cities WHERE slug = $1
                RETURNING *
            )
            SELECT {} FROM c
            "#,
            CITY_COLUMNS
        );

        let city = sqlx::query_as::<_, City>(&sql)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        if let Some(city) = &city {
            info!("Deleted city {} ({})", city.name, city.slug);
        }

        Ok(city)
    }
}
