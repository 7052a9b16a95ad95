use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::NewJob;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schemas::{coerce_query, parse_body, parse_update, JobUpdate, JOB_SEARCH};
use crate::state::AppState;

// Non-numeric ids can never match a row.
fn parse_id(raw: &str) -> Result<i32, ApiError> {
    raw.parse::<i32>()
        .map_err(|_| ApiError::not_found(format!("No job: {}", raw)))
}

/// POST /jobs { title, salary, equity, companyHandle } => { job }
pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Value> {
    let new_job: NewJob = parse_body(body)?;
    let job = state.jobs().create(&new_job).await?;
    Ok(ApiResponse::created(json!({ "job": job })))
}

/// GET /jobs?title=&minSalary=&hasEquity= => { jobs: [...] }
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Value> {
    let search = coerce_query(params, JOB_SEARCH)?;
    let repo = state.jobs();
    let jobs = if search.is_empty() {
        repo.find_all().await?
    } else {
        repo.find_filter(&search).await?
    };
    Ok(ApiResponse::success(json!({ "jobs": jobs })))
}

pub async fn get(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let job = state.jobs().get(parse_id(&id)?).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

/// PATCH /jobs/:id { title, salary, equity } => { job }
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    let mut data = parse_update::<JobUpdate>(body)?;
    // "0.5" is accepted as equity; bind it as a number
    if let Some(Value::String(raw)) = data.get("equity") {
        if let Ok(equity) = raw.parse::<f64>() {
            data.insert("equity".to_string(), Value::from(equity));
        }
    }
    let job = state.jobs().update(id, &data).await?;
    Ok(ApiResponse::success(json!({ "job": job })))
}

pub async fn remove(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Value> {
    let id = parse_id(&id)?;
    state.jobs().remove(id).await?;
    Ok(ApiResponse::success(json!({ "deleted": id })))
}
