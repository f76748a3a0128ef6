use axum::extract::{Path, State};
use axum::routing::{get, put};
use axum::{Json, Router};

use super::access::BoardAccess;
use super::error::ApiError;
use super::extract::{JsonBody, QueryParams};
use super::{AppState, ApplicationQuery};
use crate::schema::Application;
use crate::workflow::ReviewDecision;

pub(super) fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/board/applications", get(applications))
        .route("/api/board/applications/:id", put(review))
}

async fn applications(
    State(state): State<AppState>,
    _access: BoardAccess,
    QueryParams(query): QueryParams<ApplicationQuery>,
) -> Result<Json<Vec<Application>>, ApiError> {
    Ok(Json(state.workflow.list(query.into()).await?))
}

/// Shortlist, score, reject or hire, as the transition table allows for the board.
async fn review(
    State(state): State<AppState>,
    access: BoardAccess,
    Path(id): Path<i32>,
    JsonBody(decision): JsonBody<ReviewDecision>,
) -> Result<Json<Application>, ApiError> {
    Ok(Json(
        state.workflow.review(id, access.role(), decision).await?,
    ))
}
