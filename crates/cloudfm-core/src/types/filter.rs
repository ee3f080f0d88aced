//! Filter types for metadata-store queries.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::traits::metadata::Document;

/// Filter comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOp {
    /// Exact equality.
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
}

/// A dynamic filter value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// A string value.
    String(String),
    /// An integer value.
    Integer(i64),
    /// A boolean value.
    Boolean(bool),
}

/// A single filter condition on a named field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterField {
    /// The field name to filter on.
    pub field: String,
    /// The comparison operator.
    pub op: FilterOp,
    /// The value to compare against.
    pub value: FilterValue,
}

impl FilterField {
    /// Create a new filter field.
    pub fn new(field: impl Into<String>, op: FilterOp, value: FilterValue) -> Self {
        Self {
            field: field.into(),
            op,
            value,
        }
    }

    /// Shorthand for a string equality filter.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Eq, FilterValue::String(value.into()))
    }

    /// Shorthand for a string `>=` filter.
    pub fn gte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Gte, FilterValue::String(value.into()))
    }

    /// Shorthand for a string `<=` filter.
    pub fn lte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FilterOp::Lte, FilterValue::String(value.into()))
    }

    /// Shorthand for an integer `>` filter.
    pub fn gt_int(field: impl Into<String>, value: i64) -> Self {
        Self::new(field, FilterOp::Gt, FilterValue::Integer(value))
    }

    /// Evaluate this filter against a document.
    ///
    /// A missing field or a type mismatch never matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let Some(actual) = doc.get(&self.field) else {
            return false;
        };
        let ordering = match (&self.value, actual) {
            (FilterValue::String(expected), Value::String(s)) => s.as_str().cmp(expected.as_str()),
            (FilterValue::Integer(expected), Value::Number(n)) => match n.as_i64() {
                Some(v) => v.cmp(expected),
                None => return false,
            },
            (FilterValue::Boolean(expected), Value::Bool(b)) => b.cmp(expected),
            _ => return false,
        };
        match self.op {
            FilterOp::Eq => ordering == Ordering::Equal,
            FilterOp::Ne => ordering != Ordering::Equal,
            FilterOp::Gt => ordering == Ordering::Greater,
            FilterOp::Gte => ordering != Ordering::Less,
            FilterOp::Lt => ordering == Ordering::Less,
            FilterOp::Lte => ordering != Ordering::Greater,
        }
    }
}
