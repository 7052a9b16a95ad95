use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::database::manager::DatabaseError;
use crate::database::models::{Job, NewJob};
use crate::database::repository::Repository;
use crate::filter::{FieldMap, FieldRule, FieldRules, FilterOp};

pub const JOB_FIELDS: FieldMap = FieldMap::new(&[("companyHandle", "company_handle")]);

// hasEquity means equity strictly above zero
pub const JOB_FILTERS: FieldRules = FieldRules::new(
    &[
        FieldRule::contains("title", "title"),
        FieldRule::new("minSalary", "salary", FilterOp::Gte),
        FieldRule::flag("hasEquity", "equity", FilterOp::Gt, 0),
    ],
    &[],
);

const JOB_COLUMNS: &str = "id, title, salary, equity, company_handle";

pub struct JobRepository {
    repo: Repository<Job>,
}

impl JobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: Repository::new("jobs", pool) }
    }

    /// Fails with `NotFound` when the company does not exist.
    pub async fn create(&self, data: &NewJob) -> Result<Job, DatabaseError> {
        let job = sqlx::query_as::<_, Job>(&format!(
            "INSERT INTO jobs (title, salary, equity, company_handle)
             VALUES ($1, $2, $3, $4)
             RETURNING {}",
            JOB_COLUMNS
        ))
        .bind(&data.title)
        .bind(data.salary)
        .bind(data.equity)
        .bind(&data.company_handle)
        .fetch_one(self.repo.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return DatabaseError::NotFound(format!("No company: {}", data.company_handle));
                }
            }
            DatabaseError::Sqlx(e)
        })?;

        tracing::info!("Created job {} for {}", job.id, job.company_handle);
        Ok(job)
    }

    pub async fn find_all(&self) -> Result<Vec<Job>, DatabaseError> {
        self.find_filter(&Map::new()).await
    }

    /// Search by `title` (substring, case-insensitive), `minSalary`, `hasEquity`.
    pub async fn find_filter(&self, search: &Map<String, Value>) -> Result<Vec<Job>, DatabaseError> {
        self.repo
            .select_where(JOB_COLUMNS, search, &JOB_FILTERS, "company_handle, title")
            .await
    }

    pub async fn get(&self, id: i32) -> Result<Job, DatabaseError> {
        sqlx::query_as::<_, Job>(&format!("SELECT {} FROM jobs WHERE id = $1", JOB_COLUMNS))
            .bind(id)
            .fetch_optional(self.repo.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))
    }

    pub async fn update(&self, id: i32, data: &Map<String, Value>) -> Result<Job, DatabaseError> {
        self.repo
            .update_returning(data, &JOB_FIELDS, "id", Value::from(id), JOB_COLUMNS)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No job: {}", id)))
    }

    pub async fn remove(&self, id: i32) -> Result<(), DatabaseError> {
        if !self.repo.delete_by_key("id", Value::from(id)).await? {
            return Err(DatabaseError::NotFound(format!("No job: {}", id)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::{FilterError, FilterWhere};
    use serde_json::json;

    #[test]
    fn unknown_job_filter_is_rejected() {
        let search = json!({ "maxSalary": 100 });
        let err = FilterWhere::generate(search.as_object().unwrap(), &JOB_FILTERS).unwrap_err();
        assert_eq!(err, FilterError::InvalidFilterField("maxSalary".to_string()));
    }

    #[test]
    fn has_equity_false_yields_no_where_clause() {
        let search = json!({ "hasEquity": false });
        let fragment = FilterWhere::generate(search.as_object().unwrap(), &JOB_FILTERS).unwrap();
        assert!(fragment.clause.is_empty());
        assert!(fragment.params.is_empty());
    }

    #[test]
    fn has_equity_true_compares_against_zero() {
        let search = json!({ "hasEquity": true });
        let fragment = FilterWhere::generate(search.as_object().unwrap(), &JOB_FILTERS).unwrap();
        assert_eq!(fragment.clause, "\"equity\" > $1");
        assert_eq!(fragment.params, vec![json!(0)]);
    }
}
