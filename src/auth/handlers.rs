use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, PublicUser, RefreshRequest, RegisterRequest},
        jwt::JwtKeys,
        services::{self, AuthError},
        session::Session,
    },
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn reject(e: AuthError) -> (StatusCode, String) {
    match e {
        AuthError::Validation => (StatusCode::BAD_REQUEST, e.to_string()),
        AuthError::DuplicateUsername => (StatusCode::CONFLICT, e.to_string()),
        AuthError::Hashing(_) | AuthError::Store(_) => {
            error!(error = ?e, "auth operation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".into(),
            )
        }
    }
}

fn issue_tokens(keys: &JwtKeys, session: Session) -> Result<AuthResponse, (StatusCode, String)> {
    let access_token = keys.sign_access(&session).map_err(|e| {
        error!(error = %e, "jwt sign access failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    let refresh_token = keys.sign_refresh(&session).map_err(|e| {
        error!(error = %e, "jwt sign refresh failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user: PublicUser {
            username: session.username,
            role: session.role,
        },
    })
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<PublicUser>), (StatusCode, String)> {
    let user = services::register(
        state.users.as_ref(),
        &payload.username,
        &payload.password,
        payload.role,
    )
    .await
    .map_err(|e| {
        if matches!(e, AuthError::DuplicateUsername) {
            warn!("username already registered");
        }
        reject(e)
    })?;

    Ok((
        StatusCode::CREATED,
        Json(PublicUser {
            username: user.username,
            role: user.role,
        }),
    ))
}

#[instrument(skip(state, payload), fields(username = %payload.username))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let role = services::authenticate(state.users.as_ref(), &payload.username, &payload.password)
        .await
        .map_err(reject)?;

    let Some(role) = role else {
        warn!("invalid username or password");
        return Err((
            StatusCode::UNAUTHORIZED,
            "Invalid username or password".into(),
        ));
    };

    let keys = JwtKeys::from_ref(&state);
    let response = issue_tokens(&keys, Session::new(payload.username, role))?;
    info!(role = %role, "user logged in");
    Ok(Json(response))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, (StatusCode, String)> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    // Role comes from the store, not the old token.
    let user = services::find_user(state.users.as_ref(), &claims.sub)
        .await
        .map_err(reject)?
        .ok_or((StatusCode::UNAUTHORIZED, "User not found".to_string()))?;

    let response = issue_tokens(&keys, Session::new(user.username, user.role))?;
    Ok(Json(response))
}

#[instrument(skip_all, fields(username = %session.username))]
pub async fn get_me(session: Session) -> Json<PublicUser> {
    Json(PublicUser {
        username: session.username,
        role: session.role,
    })
}
