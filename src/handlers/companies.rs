use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::{json, Value};

use crate::database::models::NewCompany;
use crate::middleware::{ApiResponse, ApiResult};
use crate::schemas::{coerce_query, parse_body, parse_update, CompanyUpdate, COMPANY_SEARCH};
use crate::state::AppState;

/// POST /companies { company } => { company }
pub async fn create(State(state): State<AppState>, Json(body): Json<Value>) -> ApiResult<Value> {
    let new_company: NewCompany = parse_body(body)?;
    let company = state.companies().create(&new_company).await?;
    Ok(ApiResponse::created(json!({ "company": company })))
}

/// GET /companies?name=&minEmployees=&maxEmployees= => { companies: [...] }
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<Vec<(String, String)>>,
) -> ApiResult<Value> {
    let search = coerce_query(params, COMPANY_SEARCH)?;
    let repo = state.companies();
    let companies = if search.is_empty() {
        repo.find_all().await?
    } else {
        repo.find_filter(&search).await?
    };
    Ok(ApiResponse::success(json!({ "companies": companies })))
}

/// GET /companies/:handle => { company } with its jobs
pub async fn get(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    let company = state.companies().get(&handle).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// PATCH /companies/:handle { name, description, numEmployees, logoUrl } => { company }
pub async fn update(
    State(state): State<AppState>,
    Path(handle): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Value> {
    let data = parse_update::<CompanyUpdate>(body)?;
    let company = state.companies().update(&handle, &data).await?;
    Ok(ApiResponse::success(json!({ "company": company })))
}

/// DELETE /companies/:handle => { deleted: handle }
pub async fn remove(State(state): State<AppState>, Path(handle): Path<String>) -> ApiResult<Value> {
    state.companies().remove(&handle).await?;
    Ok(ApiResponse::success(json!({ "deleted": handle })))
}
