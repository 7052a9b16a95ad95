//! Request body and query string validation.
//!
//! Bodies are checked against typed serde structs before they reach the data
//! layer. Update bodies stay as ordered JSON objects afterwards so the partial
//! update keeps the caller's key order.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::database::models::{NewCompany, NewJob, NewUser};
use crate::error::ApiError;

pub type FieldErrors = HashMap<String, String>;

pub trait Validate {
    /// Constraint violations keyed by field name; empty when valid.
    fn field_errors(&self) -> FieldErrors {
        FieldErrors::new()
    }
}

/// Shape of a PATCH body; `NOT_NULL` fields may be omitted but not set to null.
pub trait UpdateSchema: DeserializeOwned + Validate {
    const NOT_NULL: &'static [&'static str];
}

/// Deserializes and validates a create body.
pub fn parse_body<T: DeserializeOwned + Validate>(body: Value) -> Result<T, ApiError> {
    let parsed: T = serde_json::from_value(body).map_err(|e| ApiError::validation_error(e.to_string(), None))?;
    reject(parsed.field_errors())?;
    Ok(parsed)
}

/// Validates a PATCH body and hands back the object untouched.
pub fn parse_update<T: UpdateSchema>(body: Value) -> Result<Map<String, Value>, ApiError> {
    let Value::Object(map) = body else {
        return Err(ApiError::validation_error("Request body must be a JSON object", None));
    };

    let mut errors = FieldErrors::new();
    for field in T::NOT_NULL {
        if map.get(*field).is_some_and(Value::is_null) {
            errors.insert(field.to_string(), "must not be null".to_string());
        }
    }
    reject(errors)?;

    let parsed: T = serde_json::from_value(Value::Object(map.clone()))
        .map_err(|e| ApiError::validation_error(e.to_string(), None))?;
    reject(parsed.field_errors())?;
    Ok(map)
}

fn reject(errors: FieldErrors) -> Result<(), ApiError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(ApiError::validation_error("Invalid request body", Some(errors)))
    }
}

fn check_min(errors: &mut FieldErrors, field: &str, value: Option<i32>, min: i32) {
    if value.is_some_and(|v| v < min) {
        errors.insert(field.to_string(), format!("must be at least {}", min));
    }
}

fn check_equity(errors: &mut FieldErrors, equity: Option<Decimal>) {
    if equity.is_some_and(|e| e < Decimal::ZERO || e > Decimal::ONE) {
        errors.insert("equity".to_string(), "must be between 0 and 1".to_string());
    }
}

fn check_len(errors: &mut FieldErrors, field: &str, value: Option<&str>, min: usize, max: usize) {
    if let Some(value) = value {
        let len = value.chars().count();
        if len < min || len > max {
            errors.insert(field.to_string(), format!("length must be between {} and {}", min, max));
        }
    }
}

fn check_email(errors: &mut FieldErrors, email: Option<&str>) {
    // same rule as the table constraint: something before the '@'
    if email.is_some_and(|e| e.find('@').map_or(true, |at| at == 0)) {
        errors.insert("email".to_string(), "must be an email address".to_string());
    }
}

// Companies

impl Validate for NewCompany {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "handle", Some(&self.handle), 1, 25);
        check_len(&mut errors, "name", Some(&self.name), 1, usize::MAX);
        check_min(&mut errors, "numEmployees", self.num_employees, 0);
        errors
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CompanyUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub num_employees: Option<i32>,
    pub logo_url: Option<String>,
}

impl Validate for CompanyUpdate {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "name", self.name.as_deref(), 1, usize::MAX);
        check_min(&mut errors, "numEmployees", self.num_employees, 0);
        errors
    }
}

impl UpdateSchema for CompanyUpdate {
    const NOT_NULL: &'static [&'static str] = &["name", "description"];
}

// Jobs

impl Validate for NewJob {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "title", Some(&self.title), 1, usize::MAX);
        check_min(&mut errors, "salary", self.salary, 0);
        check_equity(&mut errors, self.equity);
        errors
    }
}

/// The owning company of a job cannot change.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct JobUpdate {
    pub title: Option<String>,
    pub salary: Option<i32>,
    pub equity: Option<Decimal>,
}

impl Validate for JobUpdate {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "title", self.title.as_deref(), 1, usize::MAX);
        check_min(&mut errors, "salary", self.salary, 0);
        check_equity(&mut errors, self.equity);
        errors
    }
}

impl UpdateSchema for JobUpdate {
    const NOT_NULL: &'static [&'static str] = &["title"];
}

// Users

impl Validate for NewUser {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "username", Some(&self.username), 1, 25);
        check_len(&mut errors, "password", Some(&self.password), 5, 20);
        check_len(&mut errors, "firstName", Some(&self.first_name), 1, 30);
        check_len(&mut errors, "lastName", Some(&self.last_name), 1, 30);
        check_email(&mut errors, Some(&self.email));
        errors
    }
}

/// Self-registration body; same as a new user minus `isAdmin`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserRegister {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<UserRegister> for NewUser {
    fn from(body: UserRegister) -> Self {
        Self {
            username: body.username,
            password: body.password,
            first_name: body.first_name,
            last_name: body.last_name,
            email: body.email,
            is_admin: false,
        }
    }
}

impl Validate for UserRegister {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "username", Some(&self.username), 1, 25);
        check_len(&mut errors, "password", Some(&self.password), 5, 20);
        check_len(&mut errors, "firstName", Some(&self.first_name), 1, 30);
        check_len(&mut errors, "lastName", Some(&self.last_name), 1, 30);
        check_email(&mut errors, Some(&self.email));
        errors
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserAuth {
    pub username: String,
    pub password: String,
}

impl Validate for UserAuth {}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct UserUpdate {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

impl Validate for UserUpdate {
    fn field_errors(&self) -> FieldErrors {
        let mut errors = FieldErrors::new();
        check_len(&mut errors, "firstName", self.first_name.as_deref(), 1, 30);
        check_len(&mut errors, "lastName", self.last_name.as_deref(), 1, 30);
        check_len(&mut errors, "password", self.password.as_deref(), 5, 20);
        check_email(&mut errors, self.email.as_deref());
        errors
    }
}

impl UpdateSchema for UserUpdate {
    const NOT_NULL: &'static [&'static str] = &["firstName", "lastName", "password", "email", "isAdmin"];
}

// Search query strings

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum QueryKind {
    Text,
    Integer,
    Boolean,
}

pub const COMPANY_SEARCH: &[(&str, QueryKind)] = &[
    ("name", QueryKind::Text),
    ("minEmployees", QueryKind::Integer),
    ("maxEmployees", QueryKind::Integer),
];

pub const JOB_SEARCH: &[(&str, QueryKind)] = &[
    ("title", QueryKind::Text),
    ("minSalary", QueryKind::Integer),
    ("hasEquity", QueryKind::Boolean),
];

/// Turns `?minEmployees=10&name=net` into `{"minEmployees": 10, "name": "net"}`.
///
/// Keys missing from `kinds` stay strings so the filter builder rejects them by name.
pub fn coerce_query(pairs: Vec<(String, String)>, kinds: &[(&str, QueryKind)]) -> Result<Map<String, Value>, ApiError> {
    let mut search = Map::new();
    let mut errors = FieldErrors::new();

    for (key, raw) in pairs {
        let kind = kinds.iter().find(|(name, _)| *name == key).map(|(_, kind)| *kind);
        let value = match kind {
            Some(QueryKind::Integer) => match raw.trim().parse::<i64>() {
                Ok(n) => Value::from(n),
                Err(_) => {
                    errors.insert(key, "must be an integer".to_string());
                    continue;
                }
            },
            Some(QueryKind::Boolean) => match raw.as_str() {
                "true" => Value::Bool(true),
                "false" => Value::Bool(false),
                _ => {
                    errors.insert(key, "must be true or false".to_string());
                    continue;
                }
            },
            Some(QueryKind::Text) | None => Value::String(raw),
        };
        search.insert(key, value);
    }

    if !errors.is_empty() {
        return Err(ApiError::validation_error("Invalid search parameters", Some(errors)));
    }
    Ok(search)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn coerces_known_search_keys() {
        let search = coerce_query(pairs(&[("name", "net"), ("minEmployees", "10")]), COMPANY_SEARCH).unwrap();
        assert_eq!(Value::Object(search), json!({ "name": "net", "minEmployees": 10 }));

        let search = coerce_query(pairs(&[("hasEquity", "true")]), JOB_SEARCH).unwrap();
        assert_eq!(search["hasEquity"], json!(true));
    }

    #[test]
    fn unknown_search_keys_pass_through() {
        let search = coerce_query(pairs(&[("maxSalary", "100")]), JOB_SEARCH).unwrap();
        assert_eq!(search["maxSalary"], json!("100"));
    }

    #[test]
    fn bad_search_values_are_rejected() {
        let err = coerce_query(pairs(&[("minEmployees", "lots")]), COMPANY_SEARCH).unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["minEmployees"], "must be an integer");

        assert!(coerce_query(pairs(&[("hasEquity", "yes")]), JOB_SEARCH).is_err());
    }

    #[test]
    fn new_job_checks_equity_and_salary() {
        let err = parse_body::<NewJob>(json!({
            "title": "t", "salary": -1, "equity": 1.5, "companyHandle": "c1"
        }))
        .unwrap_err();
        let body = err.to_json();
        assert!(body["field_errors"].get("salary").is_some());
        assert!(body["field_errors"].get("equity").is_some());

        let job = parse_body::<NewJob>(json!({
            "title": "t", "salary": 100, "equity": 0.05, "companyHandle": "c1"
        }))
        .unwrap();
        assert_eq!(job.equity, Some(Decimal::new(5, 2)));
    }

    #[test]
    fn update_keeps_key_order_and_nulls() {
        let map = parse_update::<CompanyUpdate>(json!({ "logoUrl": null, "name": "New" })).unwrap();
        let keys: Vec<&String> = map.keys().collect();
        assert_eq!(keys, vec!["logoUrl", "name"]);
        assert!(map["logoUrl"].is_null());
    }

    #[test]
    fn update_rejects_null_for_required_columns() {
        let err = parse_update::<CompanyUpdate>(json!({ "name": null })).unwrap_err();
        assert_eq!(err.to_json()["field_errors"]["name"], "must not be null");
    }

    #[test]
    fn update_rejects_unknown_fields() {
        assert!(parse_update::<JobUpdate>(json!({ "companyHandle": "c2" })).is_err());
        assert!(parse_update::<JobUpdate>(json!(["title"])).is_err());
    }

    #[test]
    fn empty_update_passes_schema() {
        // emptiness is the partial update builder's call
        assert!(parse_update::<CompanyUpdate>(json!({})).unwrap().is_empty());
    }

    #[test]
    fn new_user_checks_email_and_password() {
        let err = parse_body::<NewUser>(json!({
            "username": "u1", "password": "pw", "firstName": "F", "lastName": "L", "email": "nope"
        }))
        .unwrap_err();
        let fields = &err.to_json()["field_errors"];
        assert!(fields.get("password").is_some());
        assert!(fields.get("email").is_some());
    }

    #[test]
    fn registration_cannot_claim_admin() {
        let body = json!({
            "username": "u1", "password": "password", "firstName": "F", "lastName": "L",
            "email": "u1@x.com", "isAdmin": true
        });
        assert!(parse_body::<UserRegister>(body).is_err());
    }
}
