//! City handlers

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::info;

use crate::{
    error::{ApiError, ApiResult},
    middleware::CurrentUser,
    models::{
        MAX_PAGE_SIZE,
        city::{City, CityQuery, CreateCityRequest, UpdateCityRequest},
    },
    repositories::non_blank,
    slug::city_slug,
    state::AppState,
    validation::required_text,
};

const DEFAULT_CITY_LIMIT: u32 = 20;
const MAX_CITY_NAME_CHARS: usize = 100;
const MAX_IMAGE_URL_CHARS: usize = 2048;

fn slug_for(name: &str) -> ApiResult<String> {
    let slug = city_slug(name);
    if slug.is_empty() {
        return Err(ApiError::Validation(
            "City name must contain letters or digits".to_string(),
        ));
    }
    Ok(slug)
}

/// `GET /cities`
pub async fn list_cities(
    State(state): State<AppState>,
    Query(query): Query<CityQuery>,
) -> ApiResult<impl IntoResponse> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_CITY_LIMIT)
        .clamp(1, MAX_PAGE_SIZE);

    let cities = state
        .city_repository
        .search(non_blank(&query.search), limit)
        .await?;

    Ok(Json(json!({ "cities": cities })))
}

/// `GET /cities/:slug`
pub async fn get_city(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let city = state
        .city_repository
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("City"))?;

    Ok(Json(city))
}

/// `POST /cities`
pub async fn create_city(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<CreateCityRequest>,
) -> ApiResult<impl IntoResponse> {
    let name = required_text("City name", &payload.name, MAX_CITY_NAME_CHARS)
        .map_err(ApiError::Validation)?;
    let image_url = required_text("Image URL", &payload.image_url, MAX_IMAGE_URL_CHARS)
        .map_err(ApiError::Validation)?;
    let slug = slug_for(&name)?;

    info!("User {} creating city {}", user.id, name);

    let city = state
        .city_repository
        .create(&name, &slug, &image_url)
        .await?;

    Ok((StatusCode::CREATED, Json(city)))
}

/// Name, slug and image of a city after an edit
#[derive(Debug, Clone, PartialEq, Eq)]
struct CityEdit {
    name: String,
    slug: String,
    image_url: String,
}

/// Apply a change set to `city`; a new name brings a new slug
fn apply_changes(city: &City, changes: UpdateCityRequest) -> ApiResult<CityEdit> {
    let mut edit = CityEdit {
        name: city.name.clone(),
        slug: city.slug.clone(),
        image_url: city.image_url.clone(),
    };

    if let Some(image_url) = changes.image_url.filter(|url| !url.is_empty()) {
        edit.image_url = required_text("Image URL", &image_url, MAX_IMAGE_URL_CHARS)
            .map_err(ApiError::Validation)?;
    }

    if let Some(name) = changes.name.filter(|name| !name.is_empty()) {
        let name = required_text("City name", &name, MAX_CITY_NAME_CHARS)
            .map_err(ApiError::Validation)?;
        if name != city.name {
            edit.slug = slug_for(&name)?;
            edit.name = name;
        }
    }

    Ok(edit)
}

/// `PATCH /cities/:slug`
pub async fn update_city(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
    Json(payload): Json<UpdateCityRequest>,
) -> ApiResult<impl IntoResponse> {
    let city = state
        .city_repository
        .find_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("City"))?;

    let edit = apply_changes(&city, payload)?;

    info!("User {} updating city {}", user.id, city.slug);

    let city = state
        .city_repository
        .update(city.id, &edit.name, &edit.slug, &edit.image_url)
        .await?
        .ok_or_else(|| ApiError::not_found("City"))?;

    Ok(Json(city))
}

/// `DELETE /cities/:slug`
pub async fn delete_city(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(slug): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let city = state
        .city_repository
        .delete(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found("City"))?;

    info!("User {} deleted city {}", user.id, city.slug);

    Ok(Json(json!({
        "message": "City deleted",
        "city": city,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use uuid::Uuid;

    fn city() -> City {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        City {
            id: Uuid::new_v4(),
            name: "Казань".to_string(),
            slug: "kazan".to_string(),
            image_url: "https://img.example/kazan.jpg".to_string(),
            events_count: 3,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn test_empty_change_set_keeps_city() {
        let edit = apply_changes(&city(), UpdateCityRequest::default()).unwrap();
        assert_eq!(edit.name, "Казань");
        assert_eq!(edit.slug, "kazan");
        assert_eq!(edit.image_url, "https://img.example/kazan.jpg");

        let blank = UpdateCityRequest {
            name: Some(String::new()),
            image_url: Some(String::new()),
        };
        assert_eq!(
            apply_changes(&city(), blank).unwrap(),
            apply_changes(&city(), UpdateCityRequest::default()).unwrap()
        );
    }

    #[test]
    fn test_rename_regenerates_slug() {
        let edit = apply_changes(
            &city(),
            UpdateCityRequest {
                name: Some(" Нижний Новгород ".to_string()),
                image_url: None,
            },
        )
        .unwrap();

        assert_eq!(edit.name, "Нижний Новгород");
        assert_eq!(edit.slug, "nizhniy-novgorod");
        assert_eq!(edit.image_url, "https://img.example/kazan.jpg");
    }

    #[test]
    fn test_same_name_keeps_slug() {
        let mut current = city();
        current.slug = "kazan-old".to_string();

        let edit = apply_changes(
            &current,
            UpdateCityRequest {
                name: Some("Казань".to_string()),
                image_url: Some("https://img.example/new.jpg".to_string()),
            },
        )
        .unwrap();

        assert_eq!(edit.slug, "kazan-old");
        assert_eq!(edit.image_url, "https://img.example/new.jpg");
    }

    #[test]
    fn test_invalid_changes_are_rejected() {
        for changes in [
            UpdateCityRequest {
                name: Some("   ".to_string()),
                image_url: None,
            },
            UpdateCityRequest {
                name: Some("!!!".to_string()),
                image_url: None,
            },
            UpdateCityRequest {
                name: Some("я".repeat(101)),
                image_url: None,
            },
            UpdateCityRequest {
                name: None,
                image_url: Some("  ".to_string()),
            },
        ] {
            let err = apply_changes(&city(), changes).unwrap_err();
            assert!(matches!(err, ApiError::Validation(_)));
        }
    }
}
