//! Venue models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::AuthorSummary;

/// Stored venue
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Venue {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub images: Vec<String>,
    pub image_types: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub author_id: Uuid,
    pub upvotes: i32,
    pub downvotes: i32,
    pub rating: i32,
    pub comments_count: i32,
    pub views_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const VENUE_COLUMNS: &str = "id, name, slug, description, images, image_types, address, \
     city, category, author_id, upvotes, downvotes, rating, comments_count, views_count, \
     created_at, updated_at";

/// Venue together with its author
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VenueWithAuthor {
    #[serde(flatten)]
    pub venue: Venue,
    pub author: Option<AuthorSummary>,
}

/// Validated venue fields to insert
#[derive(Debug, Clone, PartialEq)]
pub struct NewVenue {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub image_types: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
    pub author_id: Uuid,
}

/// Request body for `POST /venues`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateVenueRequest {
    pub name: String,
    pub description: String,
    pub images: Vec<String>,
    pub image_types: Vec<String>,
    pub address: Option<String>,
    pub city: String,
    pub category: String,
}

/// Request body for `PUT /venues/:id`; absent fields are left unchanged
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateVenueRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub images: Option<Vec<String>>,
    pub image_types: Option<Vec<String>>,
    pub address: Option<String>,
    pub category: Option<String>,
}

/// Sort order for venue listings
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VenueSort {
    #[default]
    Rating,
    Name,
    Newest,
}

impl VenueSort {
    pub fn order_by(&self) -> &'static str {
        match self {
            VenueSort::Rating => "v.rating DESC, v.created_at DESC",
            VenueSort::Name => "v.name ASC",
            VenueSort::Newest => "v.created_at DESC",
        }
    }
}

/// Query parameters for venue listing
#[derive(Debug, Clone, Default, Deserialize)]
pub struct VenueQuery {
    pub city: Option<String>,
    pub category: Option<String>,
    pub sort: Option<VenueSort>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}
