use axum::{
    extract::{Path, Query as QueryParams, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::session::Session,
    queries::{
        dto::{ListParams, SubmitQueryRequest},
        repo_types::Query,
        services::{self, QueryError},
    },
    state::AppState,
};

pub fn client_routes() -> Router<AppState> {
    Router::new().route("/queries", post(submit_query))
}

pub fn support_routes() -> Router<AppState> {
    Router::new()
        .route("/queries", get(list_queries))
        .route("/queries/:id", get(get_query))
        .route("/queries/:id/close", post(close_query))
}

fn reject(e: QueryError) -> (StatusCode, String) {
    match e {
        QueryError::Validation(_) => (StatusCode::BAD_REQUEST, e.to_string()),
        QueryError::Forbidden(_) => (StatusCode::FORBIDDEN, e.to_string()),
        QueryError::NotFound => (StatusCode::NOT_FOUND, e.to_string()),
        QueryError::AlreadyClosed => (StatusCode::CONFLICT, e.to_string()),
        QueryError::Store(ref inner) => {
            error!(error = ?inner, "query store failure");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            )
        }
    }
}

#[instrument(skip(state, session, payload), fields(username = %session.username))]
pub async fn submit_query(
    State(state): State<AppState>,
    session: Session,
    Json(payload): Json<SubmitQueryRequest>,
) -> Result<(StatusCode, HeaderMap, Json<Query>), (StatusCode, String)> {
    let query = services::submit_query(state.queries.as_ref(), &session, &payload)
        .await
        .map_err(reject)?;

    let mut headers = HeaderMap::new();
    let location: HeaderValue = format!("/api/v1/queries/{}", query.id)
        .parse()
        .map_err(|_| (StatusCode::INTERNAL_SERVER_ERROR, "invalid location".to_string()))?;
    headers.insert(axum::http::header::LOCATION, location);

    Ok((StatusCode::CREATED, headers, Json(query)))
}

#[instrument(skip(state, session), fields(username = %session.username))]
pub async fn list_queries(
    State(state): State<AppState>,
    session: Session,
    QueryParams(params): QueryParams<ListParams>,
) -> Result<Json<Vec<Query>>, (StatusCode, String)> {
    let rows = services::list_queries(state.queries.as_ref(), &session, params.status)
        .await
        .map_err(reject)?;
    Ok(Json(rows))
}

#[instrument(skip(state, session), fields(username = %session.username))]
pub async fn get_query(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<Query>, (StatusCode, String)> {
    let query = services::get_query(state.queries.as_ref(), &session, id)
        .await
        .map_err(reject)?;
    Ok(Json(query))
}

/// Returns the closed query so the caller can update its view without re-listing.
#[instrument(skip(state, session), fields(username = %session.username))]
pub async fn close_query(
    State(state): State<AppState>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<Json<Query>, (StatusCode, String)> {
    let query = services::close_query(state.queries.as_ref(), &session, id)
        .await
        .map_err(reject)?;
    Ok(Json(query))
}
