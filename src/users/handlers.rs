use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    error::AppError,
    state::AppState,
    users::{
        dto::{UserBody, UserSaved},
        repo_types::User,
    },
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:id", get(get_user).post(upsert_user))
}

pub(crate) fn json_body<T>(body: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    body.map(|Json(v)| v).map_err(|e| {
        warn!(error = %e, "json body rejected");
        AppError::invalid(format!("Request must be JSON: {}", e.body_text()))
    })
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<User>, AppError> {
    match state.users.get_user(&user_id).await? {
        Some(user) => Ok(Json(user)),
        None => Err(AppError::NotFound(format!(
            "User not found with ID: {user_id}"
        ))),
    }
}

/// POST /users/{id}: create or merge.
#[instrument(skip(state, body))]
pub async fn upsert_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    body: Result<Json<UserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSaved>), AppError> {
    let fields = json_body(body)?.into_fields(Some(&user_id))?;
    let saved = state.users.upsert_user(&fields).await?;

    let status = if saved.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    info!(user_id = %saved.user.user_id, created = saved.created, "user saved");
    Ok((
        status,
        Json(UserSaved {
            status: "success",
            message: format!("User data saved successfully for ID: {}", saved.user.user_id),
            user: saved.user,
        }),
    ))
}

/// POST /users: create only, 409 when the id exists.
#[instrument(skip(state, body))]
pub async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<UserBody>, JsonRejection>,
) -> Result<(StatusCode, Json<UserSaved>), AppError> {
    let fields = json_body(body)?.into_fields(None)?;
    let user = state.users.create_user(&fields).await?;

    info!(user_id = %user.user_id, "user created");
    Ok((
        StatusCode::CREATED,
        Json(UserSaved {
            status: "success",
            message: format!("User created with ID: {}", user.user_id),
            user,
        }),
    ))
}
