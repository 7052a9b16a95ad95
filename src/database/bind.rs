use serde_json::Value;
use sqlx::{postgres::PgArguments, postgres::PgRow, FromRow, Postgres};

type QueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, PgArguments>;

/// Binds one JSON value as the next positional parameter.
pub fn bind_value<'q, O>(q: QueryAs<'q, O>, v: &'q Value) -> QueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    match v {
        // int8 NULL assigns into text, integer and numeric columns alike
        Value::Null => q.bind(None::<i64>),
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                q.bind(i)
            } else if n.is_u64() {
                // past i64::MAX; let Postgres reject it rather than wrap
                q.bind(n.to_string())
            } else if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(v.clone()), // JSONB
    }
}

pub fn bind_all<'q, O>(mut q: QueryAs<'q, O>, params: &'q [Value]) -> QueryAs<'q, O>
where
    O: for<'r> FromRow<'r, PgRow>,
{
    for p in params {
        q = bind_value(q, p);
    }
    q
}
