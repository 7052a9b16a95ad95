use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FieldRule, FieldRules, FilterTransform, SqlFragment};

/// Builds a conjunctive `WHERE` predicate from a search object and an entity's rule table.
pub struct FilterWhere {
    conditions: Vec<String>,
    param_values: Vec<Value>,
}

impl FilterWhere {
    fn new() -> Self {
        Self { conditions: vec![], param_values: vec![] }
    }

    /// Validates `search` against `rules`, then emits one predicate per present key
    /// in the rule table's order. An empty search yields an empty clause.
    pub fn generate(search: &Map<String, Value>, rules: &FieldRules) -> Result<SqlFragment, FilterError> {
        Self::validate(search, rules)?;

        let mut filter_where = Self::new();
        for rule in rules.rules {
            if let Some(value) = search.get(rule.name) {
                filter_where.push_condition(rule, value);
            }
        }

        let fragment = SqlFragment {
            clause: filter_where.conditions.join(" AND "),
            params: filter_where.param_values,
        };
        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!("WHERE {} -- {} param(s)", fragment.clause, fragment.params.len());
        }
        Ok(fragment)
    }

    pub fn validate(search: &Map<String, Value>, rules: &FieldRules) -> Result<(), FilterError> {
        if let Some(unknown) = search.keys().find(|key| !rules.recognizes(key)) {
            return Err(FilterError::InvalidFilterField(unknown.clone()));
        }

        for range in rules.ranges {
            let min = search.get(range.min).and_then(Value::as_f64);
            let max = search.get(range.max).and_then(Value::as_f64);
            if let (Some(min), Some(max)) = (min, max) {
                if min > max {
                    return Err(FilterError::InvalidRange(format!(
                        "{} ({}) must be less than or equal to {} ({})",
                        range.min, min, range.max, max
                    )));
                }
            }
        }
        Ok(())
    }

    fn push_condition(&mut self, rule: &FieldRule, value: &Value) {
        // null reads as "filter not given"
        if value.is_null() {
            return;
        }

        let bound = match rule.transform {
            FilterTransform::Identity => value.clone(),
            FilterTransform::Contains => Value::String(Self::contains_pattern(value)),
            FilterTransform::Flag(threshold) => {
                if value.as_bool() != Some(true) {
                    return;
                }
                Value::from(threshold)
            }
        };

        let placeholder = self.param(bound);
        self.conditions
            .push(format!("\"{}\" {} {}", rule.column, rule.operator.to_sql(), placeholder));
    }

    fn contains_pattern(value: &Value) -> String {
        let text = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        let mut escaped = String::with_capacity(text.len() + 2);
        escaped.push('%');
        for c in text.chars() {
            if matches!(c, '%' | '_' | '\\') {
                escaped.push('\\');
            }
            escaped.push(c);
        }
        escaped.push('%');
        escaped
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}
