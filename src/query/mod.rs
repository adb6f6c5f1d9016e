//! Query-string translation for txquery.
//!
//! Seven option names are recognized (`with`, `scopes`, `count`, `orderBy`,
//! `groupBy`, `paginate`, `exclude`). They are parsed out of the request's
//! query parameters into [`QueryOptions`] and then replayed onto any
//! [`QueryBuilder`] the ORM layer provides.
//!
//! # Usage
//!
//! ```ignore
//! use txquery::query::{
//!     apply_options, apply_sort, PageRequest, QueryBag, QueryOptions, QueryPlan,
//! };
//!
//! let bag = QueryBag::parse("with=posts,comments&sort=age|desc");
//! let options = QueryOptions::from_bag(&bag);
//!
//! let page = PageRequest::from_bag(&bag, 15);
//! let plan = apply_options(QueryPlan::new("users"), &options, page)?;
//! let plan = apply_sort(plan, bag.get("sort"), "id")?;
//! ```

mod bag;
mod builder;
mod error;
mod options;
mod pagination;
mod pipeline;
mod scopes;
mod sort;

pub use bag::QueryBag;
pub use builder::{Fetch, QueryBuilder, QueryPlan, QueryStep};
pub use error::{QueryError, QueryResult};
pub use options::{OptionValue, QueryField, QueryOptions};
pub use pagination::{PageRequest, Pagination};
pub use pipeline::{apply_options, apply_sort};
pub use scopes::{Scope, ScopeSpec};
pub use sort::{parse_sort, parse_sort_value, SortDirection, SortSpec};
