//! City models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// City that events and venues are attached to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub image_url: String,
    pub events_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Query parameters for city search
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityQuery {
    pub search: Option<String>,
    pub limit: Option<u32>,
}

/// Request body for `POST /cities`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateCityRequest {
    pub name: String,
    pub image_url: String,
}

/// Request body for `PATCH /cities/:slug`; empty fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCityRequest {
    pub name: Option<String>,
    pub image_url: Option<String>,
}
