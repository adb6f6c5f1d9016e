//! `paginate=` handling.
//!
//! Accepted values:
//! - `true`: page size from `per_page`, page number from `page`
//! - `false` or empty: no pagination
//! - `N`: page size N, page number from `page`
//! - `N,P`: page P of size N, ignoring `per_page` and `page`
//!
//! A missing or unusable `per_page` falls back to the configured default, a
//! missing or unusable `page` to 1.

use serde::Serialize;

use crate::query::bag::QueryBag;
use crate::query::error::{QueryError, QueryResult};
use crate::query::options::OptionValue;

/// A page request. Pages start at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub per_page: usize,
    pub page: usize,
}

/// The `per_page` and `page` parameters sent alongside `paginate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub per_page: usize,
    pub page: usize,
}

impl PageRequest {
    /// First page of `per_page` rows.
    pub fn new(per_page: usize) -> Self {
        Self { per_page, page: 1 }
    }

    /// Read `per_page` and `page` from the request's query parameters.
    pub fn from_bag(bag: &QueryBag, default_per_page: usize) -> Self {
        let read = |key: &str| {
            bag.get(key)
                .and_then(|value| positive(value.as_text().trim()))
        };
        Self {
            per_page: read("per_page").unwrap_or(default_per_page),
            page: read("page").unwrap_or(1),
        }
    }
}

impl Pagination {
    pub fn new(per_page: usize, page: usize) -> Self {
        Self { per_page, page }
    }

    /// Rows to skip before this page.
    pub fn offset(&self) -> usize {
        self.per_page.saturating_mul(self.page.saturating_sub(1))
    }

    /// Interpret a `paginate` value against the page parameters of the
    /// same request.
    pub fn parse(value: &OptionValue, request: PageRequest) -> QueryResult<Option<Self>> {
        let tokens = value.as_list();
        let invalid = || QueryError::InvalidPagination(value.as_text().into_owned());

        match tokens.as_slice() {
            [flag] if flag.is_empty() || flag.eq_ignore_ascii_case("false") => Ok(None),
            [flag] if flag.eq_ignore_ascii_case("true") => {
                Ok(Some(Self::new(request.per_page, request.page)))
            }
            [per_page] => Ok(Some(Self::new(
                positive(per_page).ok_or_else(invalid)?,
                request.page,
            ))),
            [per_page, page] => Ok(Some(Self::new(
                positive(per_page).ok_or_else(invalid)?,
                positive(page).ok_or_else(invalid)?,
            ))),
            _ => Err(invalid()),
        }
    }
}

fn positive(token: &str) -> Option<usize> {
    token.parse::<usize>().ok().filter(|n| *n > 0)
}
