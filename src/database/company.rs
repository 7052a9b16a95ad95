use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Company, CompanyDetail, JobSummary, NewCompany};
use crate::database::repository::Repository;
use crate::filter::{FieldMap, FieldRule, FieldRules, FilterOp, RangeRule};

pub const COMPANY_FIELDS: FieldMap = FieldMap::new(&[
    ("numEmployees", "num_employees"),
    ("logoUrl", "logo_url"),
]);

pub const COMPANY_FILTERS: FieldRules = FieldRules::new(
    &[
        FieldRule::contains("name", "name"),
        FieldRule::new("minEmployees", "num_employees", FilterOp::Gte),
        FieldRule::new("maxEmployees", "num_employees", FilterOp::Lte),
    ],
    &[RangeRule { min: "minEmployees", max: "maxEmployees" }],
);

const COMPANY_COLUMNS: &str = "handle, name, description, num_employees, logo_url";

pub struct CompanyRepository {
    repo: Repository<Company>,
}

impl CompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: Repository::new("companies", pool) }
    }

    /// Fails with `Duplicate` when the handle is taken.
    pub async fn create(&self, data: &NewCompany) -> Result<Company, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT handle FROM companies WHERE handle = $1")
            .bind(&data.handle)
            .fetch_optional(self.repo.pool())
            .await?;
        if existing.is_some() {
            return Err(DatabaseError::Duplicate(format!("Duplicate company: {}", data.handle)));
        }

        let company = sqlx::query_as::<_, Company>(&format!(
            "INSERT INTO companies (handle, name, description, num_employees, logo_url)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            COMPANY_COLUMNS
        ))
        .bind(&data.handle)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.num_employees)
        .bind(&data.logo_url)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Created company {}", company.handle);
        Ok(company)
    }

    pub async fn find_all(&self) -> Result<Vec<Company>, DatabaseError> {
        self.find_filter(&Map::new()).await
    }

    /// Search by `name` (substring, case-insensitive), `minEmployees`, `maxEmployees`.
    pub async fn find_filter(&self, search: &Map<String, Value>) -> Result<Vec<Company>, DatabaseError> {
        self.repo.select_where(COMPANY_COLUMNS, search, &COMPANY_FILTERS, "name").await
    }

    pub async fn get(&self, handle: &str) -> Result<CompanyDetail, DatabaseError> {
        let company = sqlx::query_as::<_, Company>(&format!(
            "SELECT {} FROM companies WHERE handle = $1",
            COMPANY_COLUMNS
        ))
        .bind(handle)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))?;

        let jobs = sqlx::query_as::<_, JobSummary>(
            "SELECT id, title, salary, equity FROM jobs WHERE company_handle = $1 ORDER BY id",
        )
        .bind(handle)
        .fetch_all(self.repo.pool())
        .await?;

        Ok(CompanyDetail { company, jobs })
    }

    /// Partial update: only the keys present in `data` change.
    pub async fn update(&self, handle: &str, data: &Map<String, Value>) -> Result<Company, DatabaseError> {
        self.repo
            .update_returning(data, &COMPANY_FIELDS, "handle", Value::from(handle), COMPANY_COLUMNS)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No company: {}", handle)))
    }

    pub async fn remove(&self, handle: &str) -> Result<(), DatabaseError> {
        if !self.repo.delete_by_key("handle", Value::from(handle)).await? {
            return Err(DatabaseError::NotFound(format!("No company: {}", handle)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterError, FilterUpdate, FilterWhere};
    use serde_json::json;

    #[test]
    fn company_search_fragment() {
        let search = json!({ "name": "ab", "minEmployees": 100, "maxEmployees": 1000 });
        let fragment = FilterWhere::generate(search.as_object().unwrap(), &COMPANY_FILTERS).unwrap();

        assert_eq!(
            fragment.clause,
            "\"name\" ILIKE $1 AND \"num_employees\" >= $2 AND \"num_employees\" <= $3"
        );
        assert_eq!(fragment.params, vec![json!("%ab%"), json!(100), json!(1000)]);
    }

    #[test]
    fn company_search_rejects_inverted_range() {
        let search = json!({ "minEmployees": 1000, "maxEmployees": 100 });
        let err = FilterWhere::generate(search.as_object().unwrap(), &COMPANY_FILTERS).unwrap_err();
        assert!(matches!(err, FilterError::InvalidRange(_)));
    }

    #[test]
    fn company_update_maps_camel_case_fields() {
        let data = json!({ "numEmployees": 10, "logoUrl": "http://x.img", "name": "New" });
        let fragment = FilterUpdate::generate(data.as_object().unwrap(), &COMPANY_FIELDS).unwrap();

        assert_eq!(fragment.clause, "\"num_employees\"=$1, \"logo_url\"=$2, \"name\"=$3");
        assert_eq!(fragment.next_placeholder(), "$4");
    }
}
