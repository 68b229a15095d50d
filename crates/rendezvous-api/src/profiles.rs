use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use rendezvous_types::api::{CreateProfileRequest, ProfileListQuery, UpdateProfileRequest};
use rendezvous_types::models::{Profile, ProfileWithComments};

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

/// `GET /profiles?page&limit&min_age&max_age&gender`
pub async fn list_profiles(
    State(state): State<AppState>,
    query: Result<Query<ProfileListQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Profile>>> {
    let Query(query) = query?;
    let (filter, page) = query.validate()?;

    let profiles = blocking(&state, move |db| db.list_profiles(&filter, page)).await?;
    Ok(Json(profiles))
}

pub async fn create_profile(
    State(state): State<AppState>,
    payload: Result<Json<CreateProfileRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(req) = payload?;
    let new = req.validate()?;

    let profile = blocking(&state, move |db| db.create_profile(&new)).await?;
    Ok((StatusCode::CREATED, Json(profile)))
}

pub async fn get_profile(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<Json<ProfileWithComments>> {
    let Path(id) = path?;

    blocking(&state, move |db| db.get_profile_with_comments(id))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { entity: "Profile", id })
}

/// Partial update: keys missing from the body keep their stored values.
pub async fn update_profile(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<UpdateProfileRequest>, JsonRejection>,
) -> ApiResult<Json<Profile>> {
    let Path(id) = path?;
    let Json(req) = payload?;
    let changes = req.validate()?;

    blocking(&state, move |db| db.update_profile(id, &changes))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound { entity: "Profile", id })
}

/// Comments go with the profile.
pub async fn delete_profile(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;

    if blocking(&state, move |db| db.delete_profile(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound { entity: "Profile", id })
    }
}
