use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    /// NUMERIC; serialized as a string ("0.05") to keep full precision
    pub equity: Option<Decimal>,
    pub company_handle: String,
}

/// Job as listed under its company
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSummary {
    pub id: i32,
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

/// Body of `POST /jobs`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewJob {
    pub title: String,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
    pub company_handle: String,
}
