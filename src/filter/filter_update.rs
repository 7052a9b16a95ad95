use serde_json::{Map, Value};

use super::error::FilterError;
use super::types::{FieldMap, SqlFragment};

/// Builds the assignment list of a partial `UPDATE`.
pub struct FilterUpdate {
    assignments: Vec<String>,
    param_values: Vec<Value>,
}

impl FilterUpdate {
    fn new() -> Self {
        Self { assignments: vec![], param_values: vec![] }
    }

    /// `{firstName: "Aliya", age: 32}` with `firstName -> first_name` becomes
    /// `"first_name"=$1, "age"=$2` bound to `["Aliya", 32]`.
    ///
    /// Keys are taken in the order the payload presents them. `null` is a value
    /// like any other and is bound, not dropped.
    pub fn generate(payload: &Map<String, Value>, field_map: &FieldMap) -> Result<SqlFragment, FilterError> {
        if payload.is_empty() {
            return Err(FilterError::NoFieldsToUpdate);
        }

        let mut filter_update = Self::new();
        for (field, value) in payload {
            filter_update.assign(field_map.column(field), value.clone());
        }

        let fragment = SqlFragment {
            clause: filter_update.assignments.join(", "),
            params: filter_update.param_values,
        };
        if crate::config::CONFIG.filter.debug_logging {
            tracing::debug!("SET {} -- {} param(s)", fragment.clause, fragment.params.len());
        }
        Ok(fragment)
    }

    fn assign(&mut self, column: &str, value: Value) {
        let placeholder = self.param(value);
        self.assignments
            .push(format!("\"{}\"={}", column.replace('"', "\"\""), placeholder));
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        format!("${}", self.param_values.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const USER_FIELDS: FieldMap = FieldMap::new(&[("firstName", "first_name"), ("lastName", "last_name")]);

    fn payload(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn maps_columns_and_numbers_placeholders_in_key_order() {
        let data = payload(json!({ "firstName": "Nathan", "age": 23 }));
        let fragment = FilterUpdate::generate(&data, &FieldMap::new(&[("firstName", "first_name")])).unwrap();

        assert_eq!(fragment.clause, "\"first_name\"=$1, \"age\"=$2");
        assert_eq!(fragment.params, vec![json!("Nathan"), json!(23)]);
    }

    #[test]
    fn keeps_encounter_order_rather_than_sorting() {
        let data = payload(json!({ "lastName": "Cuenca", "age": 23, "firstName": "Nathan" }));
        let fragment = FilterUpdate::generate(&data, &USER_FIELDS).unwrap();

        assert_eq!(fragment.clause, "\"last_name\"=$1, \"age\"=$2, \"first_name\"=$3");
        assert_eq!(fragment.params, vec![json!("Cuenca"), json!(23), json!("Nathan")]);
    }

    #[test]
    fn empty_payload_is_rejected() {
        let err = FilterUpdate::generate(&Map::new(), &USER_FIELDS).unwrap_err();
        assert_eq!(err, FilterError::NoFieldsToUpdate);
    }

    #[test]
    fn null_is_bound_not_skipped() {
        let data = payload(json!({ "logoUrl": null, "description": "New" }));
        let fragment = FilterUpdate::generate(&data, &FieldMap::new(&[("logoUrl", "logo_url")])).unwrap();

        assert_eq!(fragment.clause, "\"logo_url\"=$1, \"description\"=$2");
        assert_eq!(fragment.params, vec![Value::Null, json!("New")]);
    }

    #[test]
    fn one_param_per_placeholder_without_gaps() {
        let data = payload(json!({ "a": 1, "b": null, "c": true, "d": "x", "e": 2.5 }));
        let fragment = FilterUpdate::generate(&data, &FieldMap::identity()).unwrap();

        let clauses: Vec<&str> = fragment.clause.split(", ").collect();
        assert_eq!(clauses.len(), fragment.params.len());
        for (i, clause) in clauses.iter().enumerate() {
            assert!(clause.ends_with(&format!("=${}", i + 1)), "clause {} is {}", i, clause);
        }
        assert_eq!(fragment.next_placeholder(), "$6");
    }

    #[test]
    fn repeated_calls_are_identical() {
        let data = payload(json!({ "firstName": "Aliya", "age": 32 }));
        let first = FilterUpdate::generate(&data, &USER_FIELDS).unwrap();
        let second = FilterUpdate::generate(&data, &USER_FIELDS).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn quotes_in_unmapped_keys_stay_inside_the_identifier() {
        let data = payload(json!({ "x\" = 1; --": "boom" }));
        let fragment = FilterUpdate::generate(&data, &FieldMap::identity()).unwrap();

        assert_eq!(fragment.clause, "\"x\"\" = 1; --\"=$1");
        assert_eq!(fragment.params, vec![json!("boom")]);
    }
}
