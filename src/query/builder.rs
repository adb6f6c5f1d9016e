//! The query collaborator.
//!
//! txquery never executes queries. It sequences calls on a [`QueryBuilder`]
//! supplied by the ORM layer and, for reads, hands the result to [`Fetch`].
//! [`QueryPlan`] is a builder that only records the calls it receives.

use std::fmt;

use serde::Serialize;

use crate::query::pagination::Pagination;
use crate::query::scopes::ScopeSpec;
use crate::query::sort::{SortDirection, SortSpec};

/// Query shaping calls the translator can issue.
pub trait QueryBuilder: Sized {
    /// Eager-load relations.
    fn with(self, relations: &[String]) -> Self;

    /// Attach counts of related collections.
    fn with_count(self, relations: &[String]) -> Self;

    /// Apply named scopes in order.
    fn apply_scopes(self, scopes: &ScopeSpec) -> Self;

    fn group_by(self, column: &str) -> Self;

    fn order_by(self, column: &str, direction: SortDirection) -> Self;

    fn paginate(self, pagination: Pagination) -> Self;

    /// Equality constraint, used for lookups by key.
    fn where_eq(self, column: &str, value: &str) -> Self;
}

/// Query execution, owned by the ORM layer.
pub trait Fetch {
    type Row;
    type Error;

    fn get(self) -> Result<Vec<Self::Row>, Self::Error>;

    fn first(self) -> Result<Option<Self::Row>, Self::Error>;
}

/// One recorded builder call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum QueryStep {
    With { relations: Vec<String> },
    WithCount { relations: Vec<String> },
    Scopes { scopes: ScopeSpec },
    GroupBy { column: String },
    OrderBy(SortSpec),
    Paginate(Pagination),
    Where { column: String, value: String },
}

impl fmt::Display for QueryStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryStep::With { relations } => write!(f, "with({})", relations.join(", ")),
            QueryStep::WithCount { relations } => {
                write!(f, "withCount({})", relations.join(", "))
            }
            QueryStep::Scopes { scopes } => write!(f, "scopes({})", scopes.names().join(", ")),
            QueryStep::GroupBy { column } => write!(f, "groupBy({column})"),
            QueryStep::OrderBy(sort) => write!(f, "orderBy({}, {})", sort.column, sort.direction),
            QueryStep::Paginate(page) => {
                write!(f, "paginate(per_page={}, page={})", page.per_page, page.page)
            }
            QueryStep::Where { column, value } => write!(f, "where({column} = {value})"),
        }
    }
}

/// A builder that records calls instead of running them.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryPlan {
    pub model: String,
    pub steps: Vec<QueryStep>,
}

impl QueryPlan {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            steps: Vec::new(),
        }
    }

    fn push(mut self, step: QueryStep) -> Self {
        self.steps.push(step);
        self
    }

    /// Sort terms in the order they were applied.
    pub fn sorts(&self) -> Vec<&SortSpec> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                QueryStep::OrderBy(sort) => Some(sort),
                _ => None,
            })
            .collect()
    }
}

impl QueryBuilder for QueryPlan {
    fn with(self, relations: &[String]) -> Self {
        self.push(QueryStep::With {
            relations: relations.to_vec(),
        })
    }

    fn with_count(self, relations: &[String]) -> Self {
        self.push(QueryStep::WithCount {
            relations: relations.to_vec(),
        })
    }

    fn apply_scopes(self, scopes: &ScopeSpec) -> Self {
        self.push(QueryStep::Scopes {
            scopes: scopes.clone(),
        })
    }

    fn group_by(self, column: &str) -> Self {
        self.push(QueryStep::GroupBy {
            column: column.to_string(),
        })
    }

    fn order_by(self, column: &str, direction: SortDirection) -> Self {
        self.push(QueryStep::OrderBy(SortSpec::new(column, direction)))
    }

    fn paginate(self, pagination: Pagination) -> Self {
        self.push(QueryStep::Paginate(pagination))
    }

    fn where_eq(self, column: &str, value: &str) -> Self {
        self.push(QueryStep::Where {
            column: column.to_string(),
            value: value.to_string(),
        })
    }
}

impl fmt::Display for QueryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model)?;
        for step in &self.steps {
            write!(f, ".{step}")?;
        }
        Ok(())
    }
}
