//! `column|direction` sort parsing.

use std::fmt;

use serde::Serialize;

use crate::query::error::{QueryError, QueryResult};
use crate::query::options::OptionValue;

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortDirection::Asc => write!(f, "asc"),
            SortDirection::Desc => write!(f, "desc"),
        }
    }
}

impl std::str::FromStr for SortDirection {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "asc" => Ok(SortDirection::Asc),
            "desc" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidSortDirection(s.to_string())),
        }
    }
}

/// One `ORDER BY` term.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortSpec {
    pub column: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(column: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            column: column.into(),
            direction,
        }
    }

    /// Parse one `column|direction` token.
    pub fn parse(token: &str) -> QueryResult<Self> {
        let segments: Vec<&str> = token.split('|').collect();
        let [column, direction] = segments.as_slice() else {
            return Err(QueryError::MalformedSort(token.to_string()));
        };

        let column = column.trim();
        if column.is_empty() {
            return Err(QueryError::MalformedSort(token.to_string()));
        }

        Ok(Self::new(column, direction.parse()?))
    }
}

/// Parse a comma-separated sort string, highest priority first.
///
/// `"age|desc,name|asc"` gives `[(age, desc), (name, asc)]`.
pub fn parse_sort(input: &str) -> QueryResult<Vec<SortSpec>> {
    input.split(',').map(SortSpec::parse).collect()
}

/// Parse a sort option value; list entries are individual tokens.
pub fn parse_sort_value(value: &OptionValue) -> QueryResult<Vec<SortSpec>> {
    match value {
        OptionValue::Text(text) => parse_sort(text),
        OptionValue::List(tokens) => tokens.iter().map(|t| SortSpec::parse(t)).collect(),
    }
}
