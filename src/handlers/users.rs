use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde_json::{json, Value};

use crate::auth::create_token;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::schemas::{parse_body, parse_update, UserUpdate};
use crate::state::AppState;

/// POST /users { user } => { user, token }
///
/// Admin-only; unlike /auth/register this may create admins.
pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Value> {
    let new_user: NewUser = parse_body(body)?;
    let user = state.users().register(&new_user).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::created(json!({ "user": user, "token": token })))
}

/// GET /users => { users: [...] }
pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let users = state.users().find_all().await?;
    Ok(ApiResponse::success(json!({ "users": users })))
}

/// GET /users/:username => { user } with applied job ids
pub async fn get(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    let user = state.users().get(&username).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

/// PATCH /users/:username { firstName, lastName, password, email, isAdmin } => { user }
///
/// Only admins may change `isAdmin`.
pub async fn update(
    State(state): State<AppState>,
    Extension(caller): Extension<AuthUser>,
    Path(username): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let data = parse_update::<UserUpdate>(body)?;
    if data.contains_key("isAdmin") && !caller.is_admin {
        return Err(ApiError::unauthorized("You must be an administrator to do this"));
    }

    let user = state.users().update(&username, &data).await?;
    Ok(ApiResponse::success(json!({ "user": user })))
}

pub async fn remove(State(state): State<AppState>, Path(username): Path<String>) -> ApiResult<Value> {
    state.users().remove(&username).await?;
    Ok(ApiResponse::success(json!({ "deleted": username })))
}

/// POST /users/:username/jobs/:id => { applied: id }
pub async fn apply(
    State(state): State<AppState>,
    Path((username, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let job_id = id
        .parse::<i32>()
        .map_err(|_| ApiError::not_found(format!("No job: {}", id)))?;

    let applied = state.users().apply(&username, job_id).await?;
    Ok(ApiResponse::success(json!({ "applied": applied })))
}
