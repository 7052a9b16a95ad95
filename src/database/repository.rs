use serde_json::{Map, Value};
use sqlx::{self, postgres::PgRow, FromRow, PgPool};

use crate::config::CONFIG;
use crate::database::bind::{bind_all, bind_value};
use crate::database::manager::DatabaseError;
use crate::filter::{FieldMap, FieldRules, FilterUpdate, FilterWhere};

/// Splices builder fragments into statements against one table and runs them.
pub struct Repository<T> {
    table_name: &'static str,
    pool: PgPool,
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Repository<T>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    pub fn new(table_name: &'static str, pool: PgPool) -> Self {
        Self {
            table_name,
            pool,
            _phantom: std::marker::PhantomData,
        }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// `SELECT <columns> FROM <table> [WHERE ...] ORDER BY <order_by>`
    pub async fn select_where(
        &self,
        columns: &str,
        search: &Map<String, Value>,
        rules: &FieldRules,
        order_by: &str,
    ) -> Result<Vec<T>, DatabaseError> {
        let fragment = FilterWhere::generate(search, rules)?;

        let query = [
            format!("SELECT {}", columns),
            format!("FROM {}", self.table_name),
            fragment.where_sql(),
            format!("ORDER BY {}", order_by),
        ]
        .into_iter()
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ");
        self.log_query(&query);

        let rows = bind_all(sqlx::query_as::<_, T>(&query), &fragment.params)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    /// `UPDATE <table> SET ... WHERE <key_column> = $n RETURNING <returning>`
    ///
    /// `None` when no row has that key.
    pub async fn update_returning(
        &self,
        payload: &Map<String, Value>,
        field_map: &FieldMap,
        key_column: &str,
        key: Value,
        returning: &str,
    ) -> Result<Option<T>, DatabaseError> {
        let fragment = FilterUpdate::generate(payload, field_map)?;

        let query = format!(
            "UPDATE {} SET {} WHERE {} = {} RETURNING {}",
            self.table_name,
            fragment.clause,
            key_column,
            fragment.next_placeholder(),
            returning
        );
        self.log_query(&query);

        let mut params = fragment.params;
        params.push(key);
        let row = bind_all(sqlx::query_as::<_, T>(&query), &params)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    /// Deletes by key; false when nothing matched.
    pub async fn delete_by_key(&self, key_column: &str, key: Value) -> Result<bool, DatabaseError> {
        let query = format!("DELETE FROM {} WHERE {} = $1 RETURNING 1", self.table_name, key_column);
        self.log_query(&query);

        let deleted = bind_value(sqlx::query_as::<_, (i32,)>(&query), &key)
            .fetch_optional(&self.pool)
            .await?;
        Ok(deleted.is_some())
    }

    fn log_query(&self, query: &str) {
        if CONFIG.database.enable_query_logging {
            tracing::debug!(table = self.table_name, "{}", query);
        }
    }
}
