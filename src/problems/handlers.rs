use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::extractors::{AdminUser, CurrentUser},
    error::ApiError,
    state::AppState,
};

use super::dto::{ProblemList, ProblemQuery, ProblemResponse, StatusUpdateRequest};
use super::repo::{self, NewProblem, ProblemStatus};
use super::upload::{self, PhotoUpload};
use super::validate;

pub fn read_routes() -> Router<AppState> {
    Router::new().route("/problems", get(list_problems))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/problems", post(create_problem))
        .route("/problems/:id/status", put(update_status))
        // photo limit is 5MB; leave headroom for the text fields
        .layer(DefaultBodyLimit::max(8 * 1024 * 1024))
}

#[instrument(skip(state))]
pub async fn list_problems(
    State(state): State<AppState>,
    Query(query): Query<ProblemQuery>,
) -> Result<Json<ProblemList>, ApiError> {
    let problems = repo::list(&state.db, &query.into_filters()).await?;
    Ok(Json(ProblemList {
        count: problems.len(),
        problems,
    }))
}

#[derive(Default)]
struct ReportFields {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    city: Option<String>,
    latitude: Option<String>,
    longitude: Option<String>,
    photo: Option<PhotoUpload>,
}

async fn collect_fields(mut multipart: Multipart) -> Result<ReportFields, ApiError> {
    let bad = |e: axum::extract::multipart::MultipartError| {
        ApiError::Validation(format!("Invalid multipart body: {e}"))
    };

    let mut fields = ReportFields::default();
    while let Some(field) = multipart.next_field().await.map_err(bad)? {
        let Some(name) = field.name().map(|s| s.to_string()) else {
            continue;
        };
        match name.as_str() {
            "title" => fields.title = Some(field.text().await.map_err(bad)?),
            "description" => fields.description = Some(field.text().await.map_err(bad)?),
            "category" => fields.category = Some(field.text().await.map_err(bad)?),
            "city" => fields.city = Some(field.text().await.map_err(bad)?),
            "latitude" => fields.latitude = Some(field.text().await.map_err(bad)?),
            "longitude" => fields.longitude = Some(field.text().await.map_err(bad)?),
            "photo" | "image" => {
                let content_type = field
                    .content_type()
                    .map(|s| s.to_string())
                    .unwrap_or_else(|| "application/octet-stream".into());
                let body = field.bytes().await.map_err(bad)?;
                // Empty file input on a form submit, not an upload.
                if !body.is_empty() {
                    fields.photo = Some(PhotoUpload { body, content_type });
                }
            }
            _ => {}
        }
    }
    Ok(fields)
}

fn require(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| ApiError::Validation(format!("{field} is required")))
}

#[instrument(skip(state, multipart, user))]
pub async fn create_problem(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<ProblemResponse>), ApiError> {
    let fields = collect_fields(multipart).await?;

    let title = require(fields.title, "Title")?;
    let description = require(fields.description, "Description")?;
    let category = require(fields.category, "Category")?;
    let city = require(fields.city, "City")?;
    let latitude = require(fields.latitude, "Latitude")?;
    let longitude = require(fields.longitude, "Longitude")?;

    validate::validate_title(&title).map_err(ApiError::Validation)?;
    validate::validate_description(&description).map_err(ApiError::Validation)?;
    validate::validate_category(&category).map_err(ApiError::Validation)?;
    validate::validate_city(&city).map_err(ApiError::Validation)?;
    let (latitude, longitude) =
        validate::validate_coords(&latitude, &longitude).map_err(ApiError::Validation)?;

    // All field validation is done; the photo is the last thing checked
    // before anything is written.
    let stored_key = match &fields.photo {
        Some(photo) => Some(upload::store_photo(&state, photo).await?),
        None => None,
    };
    let image_url = stored_key.as_deref().map(|key| format!("/uploads/{key}"));

    let input = NewProblem {
        title: validate::sanitize_text(&title),
        description: validate::sanitize_text(&description),
        category,
        city,
        latitude,
        longitude,
    };

    let problem = match repo::create(&state.db, &input, user.id, image_url.as_deref()).await {
        Ok(problem) => problem,
        Err(e) => {
            // The photo already hit the disk; do not leave it orphaned.
            if let Some(key) = &stored_key {
                upload::discard_photo(&state, key).await;
            }
            return Err(ApiError::Internal(e));
        }
    };

    info!(
        problem_id = %problem.id,
        city = %problem.city,
        category = %problem.category,
        "problem reported"
    );
    Ok((
        StatusCode::CREATED,
        Json(ProblemResponse {
            message: "Problem reported successfully".into(),
            problem,
        }),
    ))
}

#[instrument(skip(state, payload, admin))]
pub async fn update_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<StatusUpdateRequest>,
) -> Result<Json<ProblemResponse>, ApiError> {
    let status = ProblemStatus::parse(&payload.status)
        .ok_or_else(|| ApiError::Validation(format!("Invalid status: {}", payload.status)))?;

    let existing = repo::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Problem not found".into()))?;

    if !admin.scope().allows(&existing.city, &existing.category) {
        warn!(
            admin_id = %admin.id,
            problem_id = %id,
            city = %existing.city,
            "status update outside admin scope"
        );
        return Err(ApiError::Forbidden(
            "Problem is outside your permission scope".into(),
        ));
    }

    let problem = repo::update_status(&state.db, id, status, admin.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Problem not found".into()))?;

    info!(
        problem_id = %problem.id,
        status = %problem.status,
        admin_id = %admin.id,
        "problem status updated"
    );
    Ok(Json(ProblemResponse {
        message: "Status updated successfully".into(),
        problem,
    }))
}
