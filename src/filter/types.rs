use serde_json::Value;

/// Comparison operator applied by a single filter rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    ILike,
    Gt,
    Gte,
    Lte,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::ILike => "ILIKE",
            FilterOp::Gt => ">",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}

/// How a filter value is turned into the bound parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterTransform {
    /// Bind the value as given.
    Identity,
    /// Substring match: wrap the value in `%` after escaping LIKE metacharacters.
    Contains,
    /// Boolean switch: `true` compares the column against the fixed threshold,
    /// anything else emits nothing. The boolean itself is never bound.
    Flag(i64),
}

/// One recognized filter key of an entity.
#[derive(Debug, Clone, Copy)]
pub struct FieldRule {
    pub name: &'static str,
    pub column: &'static str,
    pub operator: FilterOp,
    pub transform: FilterTransform,
}

impl FieldRule {
    pub const fn new(name: &'static str, column: &'static str, operator: FilterOp) -> Self {
        Self { name, column, operator, transform: FilterTransform::Identity }
    }

    pub const fn contains(name: &'static str, column: &'static str) -> Self {
        Self { name, column, operator: FilterOp::ILike, transform: FilterTransform::Contains }
    }

    pub const fn flag(name: &'static str, column: &'static str, operator: FilterOp, threshold: i64) -> Self {
        Self { name, column, operator, transform: FilterTransform::Flag(threshold) }
    }
}

/// Cross-field constraint: when both keys are present, `min` must not exceed `max`.
#[derive(Debug, Clone, Copy)]
pub struct RangeRule {
    pub min: &'static str,
    pub max: &'static str,
}

/// Declarative filter table for one entity. Rule order is predicate order.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub rules: &'static [FieldRule],
    pub ranges: &'static [RangeRule],
}

impl FieldRules {
    pub const fn new(rules: &'static [FieldRule], ranges: &'static [RangeRule]) -> Self {
        Self { rules, ranges }
    }

    pub fn get(&self, name: &str) -> Option<&FieldRule> {
        self.rules.iter().find(|rule| rule.name == name)
    }

    pub fn recognizes(&self, name: &str) -> bool {
        self.get(name).is_some()
    }
}

/// Logical field name to storage column name. Unmapped names are used as-is.
#[derive(Debug, Clone, Copy)]
pub struct FieldMap {
    pairs: &'static [(&'static str, &'static str)],
}

impl FieldMap {
    pub const fn new(pairs: &'static [(&'static str, &'static str)]) -> Self {
        Self { pairs }
    }

    pub const fn identity() -> Self {
        Self { pairs: &[] }
    }

    pub fn column<'a>(&self, field: &'a str) -> &'a str {
        self.pairs
            .iter()
            .find(|(logical, _)| *logical == field)
            .map(|(_, column)| *column)
            .unwrap_or(field)
    }
}

/// A SQL fragment plus the parameters its placeholders bind, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SqlFragment {
    pub clause: String,
    pub params: Vec<Value>,
}

impl SqlFragment {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }

    /// Placeholder for the first parameter the caller appends after this fragment.
    pub fn next_placeholder(&self) -> String {
        format!("${}", self.params.len() + 1)
    }

    /// `WHERE <clause>`, or nothing at all when no predicate was emitted.
    pub fn where_sql(&self) -> String {
        if self.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.clause)
        }
    }
}
