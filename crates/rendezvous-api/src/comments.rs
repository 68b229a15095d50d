use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
    response::IntoResponse,
};

use rendezvous_types::api::{CreateCommentRequest, PageQuery};
use rendezvous_types::models::Comment;

use crate::error::{ApiError, ApiResult};
use crate::state::{AppState, blocking};

pub async fn list_comments(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    query: Result<Query<PageQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Comment>>> {
    let Path(profile_id) = path?;
    let Query(query) = query?;
    let page = query.validate()?;

    blocking(&state, move |db| db.list_comments(profile_id, page))
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound {
            entity: "Profile",
            id: profile_id,
        })
}

pub async fn create_comment(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
    payload: Result<Json<CreateCommentRequest>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Path(profile_id) = path?;
    let Json(req) = payload?;
    let new = req.validate()?;

    let comment = blocking(&state, move |db| db.create_comment(profile_id, &new))
        .await?
        .ok_or(ApiError::NotFound {
            entity: "Profile",
            id: profile_id,
        })?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn delete_comment(
    State(state): State<AppState>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResult<StatusCode> {
    let Path(id) = path?;

    if blocking(&state, move |db| db.delete_comment(id)).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound { entity: "Comment", id })
    }
}
