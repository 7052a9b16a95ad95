use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::auth::create_token;
use crate::database::models::NewUser;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schemas::{parse_body, UserAuth, UserRegister};
use crate::state::AppState;

/// POST /auth/token { username, password } => { token }
pub async fn token(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Value> {
    let credentials: UserAuth = parse_body(body)?;

    let user = state
        .users()
        .authenticate(&credentials.username, &credentials.password)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid username/password"))?;

    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::success(json!({ "token": token })))
}

/// POST /auth/register { username, password, firstName, lastName, email } => { token }
pub async fn register(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Value> {
    let new_user = NewUser::from(parse_body::<UserRegister>(body)?);

    let user = state.users().register(&new_user).await?;
    let token = create_token(&user.username, user.is_admin)?;
    Ok(ApiResponse::created(json!({ "token": token })))
}
