//! Venue handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;
use uuid::Uuid;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{
        PageRequest, Pagination,
        venue::{CreateVenueRequest, NewVenue, UpdateVenueRequest, Venue, VenueQuery},
    },
    state::AppState,
    validation::{
        MAX_ADDRESS_CHARS, MAX_DESCRIPTION_CHARS, MAX_TITLE_CHARS, optional_text, required_text,
        validate_venue_category, validate_venue_images,
    },
};

const DEFAULT_VENUE_LIMIT: u32 = 12;

fn validate_new_venue(payload: CreateVenueRequest, author_id: Uuid) -> ApiResult<NewVenue> {
    let name =
        required_text("Name", &payload.name, MAX_TITLE_CHARS).map_err(ApiError::Validation)?;
    let description = required_text("Description", &payload.description, MAX_DESCRIPTION_CHARS)
        .map_err(ApiError::Validation)?;
    let city = required_text("City", &payload.city, 100).map_err(ApiError::Validation)?;
    let category = validate_venue_category(&payload.category).map_err(ApiError::Validation)?;
    let address = optional_text("Address", payload.address.as_deref(), MAX_ADDRESS_CHARS)
        .map_err(ApiError::Validation)?;
    validate_venue_images(&payload.images, &payload.image_types).map_err(ApiError::Validation)?;

    Ok(NewVenue {
        name,
        description,
        images: payload.images,
        image_types: payload.image_types,
        address,
        city,
        category,
        author_id,
    })
}

fn apply_changes(mut venue: Venue, changes: UpdateVenueRequest) -> ApiResult<Venue> {
    if let Some(name) = changes.name {
        venue.name =
            required_text("Name", &name, MAX_TITLE_CHARS).map_err(ApiError::Validation)?;
    }

    if let Some(description) = changes.description {
        venue.description = required_text("Description", &description, MAX_DESCRIPTION_CHARS)
            .map_err(ApiError::Validation)?;
    }

    if let Some(category) = changes.category {
        venue.category = validate_venue_category(&category).map_err(ApiError::Validation)?;
    }

    if let Some(address) = changes.address {
        venue.address = optional_text("Address", Some(&address), MAX_ADDRESS_CHARS)
            .map_err(ApiError::Validation)?;
    }

    match (changes.images, changes.image_types) {
        (None, None) => {}
        (Some(images), Some(image_types)) => {
            validate_venue_images(&images, &image_types).map_err(ApiError::Validation)?;
            venue.images = images;
            venue.image_types = image_types;
        }
        _ => {
            return Err(ApiError::Validation(
                "Images and image types must be updated together".to_string(),
            ));
        }
    }

    Ok(venue)
}

/// `GET /venues`
pub async fn list_venues(
    State(state): State<AppState>,
    Query(query): Query<VenueQuery>,
) -> ApiResult<impl IntoResponse> {
    let page = PageRequest::new(query.page, query.limit, DEFAULT_VENUE_LIMIT);

    let (venues, total) = state.venue_repository.list(&query, page).await?;

    Ok(Json(json!({
        "venues": venues,
        "pagination": Pagination::new(page, total),
    })))
}

/// `GET /venues/:id`
pub async fn get_venue(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let venue = state
        .venue_repository
        .record_view(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venue"))?;

    Ok(Json(venue))
}

/// `POST /venues`
pub async fn create_venue(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateVenueRequest>,
) -> ApiResult<impl IntoResponse> {
    let new_venue = validate_new_venue(payload, user.id)?;

    info!("User {} creating venue {:?}", user.id, new_venue.name);

    let venue = state.venue_repository.create(&new_venue).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Venue created",
            "venue": venue,
        })),
    ))
}

/// `PUT /venues/:id`
pub async fn update_venue(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateVenueRequest>,
) -> ApiResult<impl IntoResponse> {
    let venue = state
        .venue_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venue"))?;

    user.ensure_author(venue.author_id, "edit this venue")?;

    let venue = apply_changes(venue, payload)?;
    let venue = state.venue_repository.update(&venue).await?;

    Ok(Json(json!({
        "message": "Venue updated",
        "venue": venue,
    })))
}

/// `DELETE /venues/:id`
pub async fn delete_venue(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<Uuid>,
) -> ApiResult<impl IntoResponse> {
    let venue = state
        .venue_repository
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found("Venue"))?;

    user.ensure_author(venue.author_id, "delete this venue")?;

    state.venue_repository.delete_cascade(id).await?;
    info!("User {} deleted venue {}", user.0.id, id);

    Ok(Json(json!({ "message": "Venue deleted" })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateVenueRequest {
        CreateVenueRequest {
            name: " Кафе Пушкин ".to_string(),
            description: "Русская кухня".to_string(),
            images: vec!["img".to_string()],
            image_types: vec!["image/jpeg".to_string()],
            address: Some("  ".to_string()),
            city: "Москва".to_string(),
            category: "Кафе".to_string(),
        }
    }

    #[test]
    fn test_new_venue_is_trimmed() {
        let author = Uuid::new_v4();
        let venue = validate_new_venue(request(), author).unwrap();

        assert_eq!(venue.name, "Кафе Пушкин");
        assert_eq!(venue.address, None);
        assert_eq!(venue.author_id, author);
    }

    #[test]
    fn test_new_venue_rejects_bad_input() {
        let mut unknown_category = request();
        unknown_category.category = "Кофейни".to_string();
        assert!(validate_new_venue(unknown_category, Uuid::new_v4()).is_err());

        let mut mismatched = request();
        mismatched.image_types.clear();
        assert!(validate_new_venue(mismatched, Uuid::new_v4()).is_err());

        let mut no_city = request();
        no_city.city = String::new();
        assert!(validate_new_venue(no_city, Uuid::new_v4()).is_err());
    }

    #[test]
    fn test_images_update_together() {
        let new_venue = validate_new_venue(request(), Uuid::new_v4()).unwrap();
        let now = chrono::Utc::now();
        let venue = Venue {
            id: Uuid::new_v4(),
            name: new_venue.name,
            slug: "кафе-пушкин".to_string(),
            description: new_venue.description,
            images: new_venue.images,
            image_types: new_venue.image_types,
            address: None,
            city: new_venue.city,
            category: new_venue.category,
            author_id: new_venue.author_id,
            upvotes: 0,
            downvotes: 0,
            rating: 0,
            comments_count: 0,
            views_count: 0,
            created_at: now,
            updated_at: now,
        };

        let only_images = UpdateVenueRequest {
            images: Some(vec![]),
            ..Default::default()
        };
        assert!(apply_changes(venue.clone(), only_images).is_err());

        let cleared = apply_changes(
            venue,
            UpdateVenueRequest {
                images: Some(vec![]),
                image_types: Some(vec![]),
                ..Default::default()
            },
        )
        .unwrap();
        assert!(cleared.images.is_empty());
    }
}
