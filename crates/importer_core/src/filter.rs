use std::fmt;
use std::str::FromStr;

use crate::csv::Row;

pub type FilterId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterOperator {
    #[default]
    Equals,
    NotEquals,
    Contains,
    NotContains,
    IsEmpty,
    IsNotEmpty,
}

impl FilterOperator {
    pub const ALL: [FilterOperator; 6] = [
        FilterOperator::Equals,
        FilterOperator::NotEquals,
        FilterOperator::Contains,
        FilterOperator::NotContains,
        FilterOperator::IsEmpty,
        FilterOperator::IsNotEmpty,
    ];

    /// Stable name used in configuration files.
    pub fn as_str(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "not_equals",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "not_contains",
            FilterOperator::IsEmpty => "is_empty",
            FilterOperator::IsNotEmpty => "is_not_empty",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FilterOperator::Equals => "equals",
            FilterOperator::NotEquals => "does not equal",
            FilterOperator::Contains => "contains",
            FilterOperator::NotContains => "does not contain",
            FilterOperator::IsEmpty => "is empty",
            FilterOperator::IsNotEmpty => "is not empty",
        }
    }

    fn evaluate(self, value: &str, expected: &str) -> bool {
        let value = value.trim().to_lowercase();
        let expected = expected.trim().to_lowercase();
        match self {
            FilterOperator::Equals => value == expected,
            FilterOperator::NotEquals => value != expected,
            FilterOperator::Contains => value.contains(&expected),
            FilterOperator::NotContains => !value.contains(&expected),
            FilterOperator::IsEmpty => value.is_empty(),
            FilterOperator::IsNotEmpty => !value.is_empty(),
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown filter operator {0:?}")]
pub struct UnknownOperator(pub String);

impl FromStr for FilterOperator {
    type Err = UnknownOperator;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FilterOperator::ALL
            .into_iter()
            .find(|op| op.as_str() == s)
            .ok_or_else(|| UnknownOperator(s.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterRule {
    pub id: FilterId,
    pub column: String,
    pub operator: FilterOperator,
    pub value: String,
    pub enabled: bool,
}

impl FilterRule {
    pub fn new(id: FilterId, column: impl Into<String>, operator: FilterOperator) -> Self {
        Self {
            id,
            column: column.into(),
            operator,
            value: String::new(),
            enabled: true,
        }
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    fn is_active(&self) -> bool {
        self.enabled && !self.column.is_empty()
    }

    /// A column missing from the row compares as the empty string.
    pub fn matches(&self, row: &Row) -> bool {
        let value = row.get(&self.column).map(String::as_str).unwrap_or("");
        self.operator.evaluate(value, &self.value)
    }

    pub fn apply_patch(&mut self, patch: FilterPatch) {
        if let Some(column) = patch.column {
            self.column = column;
        }
        if let Some(operator) = patch.operator {
            self.operator = operator;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }
}

/// Partial update for a [`FilterRule`]; `None` fields are left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FilterPatch {
    pub column: Option<String>,
    pub operator: Option<FilterOperator>,
    pub value: Option<String>,
    pub enabled: Option<bool>,
}

/// Keep the rows that satisfy every enabled rule with a non-empty column.
/// With no such rule the input comes back unchanged.
pub fn apply_filters(rows: &[Row], rules: &[FilterRule]) -> Vec<Row> {
    let active: Vec<&FilterRule> = rules.iter().filter(|rule| rule.is_active()).collect();
    if active.is_empty() {
        return rows.to_vec();
    }
    rows.iter()
        .filter(|row| active.iter().all(|rule| rule.matches(row)))
        .cloned()
        .collect()
}
