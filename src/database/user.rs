use std::collections::HashMap;

use serde_json::{Map, Value};
use sqlx::PgPool;

use crate::auth::password::{hash_password_blocking, verify_password_blocking};
use crate::database::manager::DatabaseError;
use crate::database::models::{NewUser, User, UserDetail, UserWithPassword};
use crate::database::repository::Repository;
use crate::filter::FieldMap;

pub const USER_FIELDS: FieldMap = FieldMap::new(&[
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("isAdmin", "is_admin"),
]);

const USER_COLUMNS: &str = "username, first_name, last_name, email, is_admin";

pub struct UserRepository {
    repo: Repository<User>,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { repo: Repository::new("users", pool) }
    }

    /// `None` for an unknown user or a wrong password; callers must not tell them apart.
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<User>, DatabaseError> {
        let row = sqlx::query_as::<_, UserWithPassword>(&format!(
            "SELECT {}, password FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.repo.pool())
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let valid = verify_password_blocking(password.to_string(), row.password).await?;
        Ok(valid.then_some(row.user))
    }

    pub async fn register(&self, data: &NewUser) -> Result<User, DatabaseError> {
        let existing = sqlx::query_scalar::<_, String>("SELECT username FROM users WHERE username = $1")
            .bind(&data.username)
            .fetch_optional(self.repo.pool())
            .await?;
        if existing.is_some() {
            return Err(DatabaseError::Duplicate(format!("Duplicate username: {}", data.username)));
        }

        let hashed = hash_password_blocking(data.password.clone()).await?;
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (username, password, first_name, last_name, email, is_admin)
             VALUES ($1, $2, $3, $4, $5, $6)
             RETURNING {}",
            USER_COLUMNS
        ))
        .bind(&data.username)
        .bind(hashed)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.email)
        .bind(data.is_admin)
        .fetch_one(self.repo.pool())
        .await?;

        tracing::info!("Registered user {}", user.username);
        Ok(user)
    }

    /// All users, each with the ids of the jobs they applied to.
    pub async fn find_all(&self) -> Result<Vec<UserDetail>, DatabaseError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users ORDER BY username",
            USER_COLUMNS
        ))
        .fetch_all(self.repo.pool())
        .await?;

        let applications = sqlx::query_as::<_, (String, i32)>(
            "SELECT username, job_id FROM applications ORDER BY username, job_id",
        )
        .fetch_all(self.repo.pool())
        .await?;

        let mut jobs_by_user: HashMap<String, Vec<i32>> = HashMap::new();
        for (username, job_id) in applications {
            jobs_by_user.entry(username).or_default().push(job_id);
        }

        Ok(users
            .into_iter()
            .map(|user| {
                let jobs = jobs_by_user.remove(&user.username).unwrap_or_default();
                UserDetail { user, jobs }
            })
            .collect())
    }

    pub async fn get(&self, username: &str) -> Result<UserDetail, DatabaseError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(self.repo.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))?;

        let jobs = sqlx::query_scalar::<_, i32>(
            "SELECT job_id FROM applications WHERE username = $1 ORDER BY job_id",
        )
        .bind(username)
        .fetch_all(self.repo.pool())
        .await?;

        Ok(UserDetail { user, jobs })
    }

    /// Partial update. A `password` key is re-hashed before it reaches the table.
    ///
    /// This can make a user an admin; callers decide who may send `isAdmin`.
    pub async fn update(&self, username: &str, data: &Map<String, Value>) -> Result<User, DatabaseError> {
        let mut data = data.clone();
        if let Some(Value::String(password)) = data.get("password") {
            let hashed = hash_password_blocking(password.clone()).await?;
            data.insert("password".to_string(), Value::String(hashed));
        }

        self.repo
            .update_returning(&data, &USER_FIELDS, "username", Value::from(username), USER_COLUMNS)
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("No user: {}", username)))
    }

    pub async fn remove(&self, username: &str) -> Result<(), DatabaseError> {
        if !self.repo.delete_by_key("username", Value::from(username)).await? {
            return Err(DatabaseError::NotFound(format!("No user: {}", username)));
        }
        Ok(())
    }

    /// Records an application and returns the job id.
    pub async fn apply(&self, username: &str, job_id: i32) -> Result<i32, DatabaseError> {
        sqlx::query_scalar::<_, i32>(
            "INSERT INTO applications (username, job_id) VALUES ($1, $2) RETURNING job_id",
        )
        .bind(username)
        .bind(job_id)
        .fetch_one(self.repo.pool())
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_foreign_key_violation() {
                    return DatabaseError::NotFound(format!("No user {} or job {}", username, job_id));
                }
                if db.is_unique_violation() {
                    return DatabaseError::Duplicate(format!("{} already applied to job {}", username, job_id));
                }
            }
            DatabaseError::Sqlx(e)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::FilterUpdate;
    use serde_json::json;

    #[test]
    fn user_update_maps_names_and_admin_flag() {
        let data = json!({ "firstName": "Aliya", "isAdmin": true, "email": "a@b.com" });
        let fragment = FilterUpdate::generate(data.as_object().unwrap(), &USER_FIELDS).unwrap();

        assert_eq!(fragment.clause, "\"first_name\"=$1, \"is_admin\"=$2, \"email\"=$3");
        assert_eq!(fragment.params, vec![json!("Aliya"), json!(true), json!("a@b.com")]);
    }
}
