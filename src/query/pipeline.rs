//! Applying [`QueryOptions`] to a builder.
//!
//! Options are applied in a fixed order, since later stages may depend on
//! relations loaded by earlier ones:
//!
//! 1. `with`     → eager loads
//! 2. `count`    → relation counts
//! 3. `scopes`   → named scopes
//! 4. `groupBy`  → grouping
//! 5. `paginate` → page window
//!
//! Sorting is separate ([`apply_sort`]) because it is driven by its own key.

use tracing::trace;

use crate::query::builder::QueryBuilder;
use crate::query::error::QueryResult;
use crate::query::options::{OptionValue, QueryField, QueryOptions};
use crate::query::pagination::{PageRequest, Pagination};
use crate::query::scopes::ScopeSpec;
use crate::query::sort::{parse_sort_value, SortDirection};

/// Run the option pipeline over `query`.
///
/// `page` carries the request's `per_page`/`page` parameters for
/// `paginate=true`. Fails only on an invalid `paginate` value, before any
/// builder call.
pub fn apply_options<Q: QueryBuilder>(
    query: Q,
    options: &QueryOptions,
    page: PageRequest,
) -> QueryResult<Q> {
    let pagination = match options.get(QueryField::Paginate) {
        Some(value) => Pagination::parse(value, page)?,
        None => None,
    };

    let mut query = query;

    if options.has(QueryField::With) {
        let relations = options.as_list(QueryField::With);
        trace!(?relations, "eager loading");
        query = query.with(&relations);
    }

    if options.has(QueryField::Count) {
        let relations = options.as_list(QueryField::Count);
        trace!(?relations, "counting relations");
        query = query.with_count(&relations);
    }

    if let Some(value) = options.get(QueryField::Scopes) {
        let scopes = ScopeSpec::from_value(value);
        trace!(scopes = ?scopes.names(), "applying scopes");
        query = query.apply_scopes(&scopes);
    }

    if let Some(value) = options.get(QueryField::GroupBy) {
        query = match value {
            OptionValue::Text(column) => query.group_by(column),
            OptionValue::List(columns) => columns.iter().fold(query, |q, c| q.group_by(c)),
        };
    }

    if let Some(pagination) = pagination {
        query = query.paginate(pagination);
    }

    Ok(query)
}

/// Apply `sort` as successive `order_by` calls, left to right.
///
/// Without a sort value, or with a blank one, the query is ordered by
/// `primary_key` ascending. A malformed value fails before any builder call.
pub fn apply_sort<Q: QueryBuilder>(
    query: Q,
    sort: Option<&OptionValue>,
    primary_key: &str,
) -> QueryResult<Q> {
    let Some(value) = sort.filter(|value| !value.is_blank()) else {
        return Ok(query.order_by(primary_key, SortDirection::Asc));
    };

    let specs = parse_sort_value(value)?;
    Ok(specs
        .iter()
        .fold(query, |q, spec| q.order_by(&spec.column, spec.direction)))
}
