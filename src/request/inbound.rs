//! Inbound request as seen by the core: a method and a query bag.

use http::Method;

use crate::query::{OptionValue, QueryBag, QueryOptions};

/// An inbound request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    method: Method,
    query: QueryBag,
}

impl Request {
    pub fn new(method: Method, query: QueryBag) -> Self {
        Self { method, query }
    }

    /// Build from a method and a raw query string.
    pub fn parse(method: Method, query_string: &str) -> Self {
        Self::new(method, QueryBag::parse(query_string))
    }

    pub fn get(query_string: &str) -> Self {
        Self::parse(Method::GET, query_string)
    }

    pub fn post(query_string: &str) -> Self {
        Self::parse(Method::POST, query_string)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn query(&self) -> &QueryBag {
        &self.query
    }

    /// Check if the method is `method`, ignoring case.
    pub fn is_method(&self, method: &str) -> bool {
        self.method.as_str().eq_ignore_ascii_case(method)
    }

    /// The recognized query options.
    pub fn query_options(&self) -> QueryOptions {
        QueryOptions::from_bag(&self.query)
    }

    /// Sort value: the `sort` key, or `orderBy` when `sort` is absent.
    ///
    /// A blank value (`sort=`) counts as absent.
    pub fn sort(&self) -> Option<&OptionValue> {
        let present = |key: &str| self.query.get(key).filter(|value| !value.is_blank());
        present("sort").or_else(|| present("orderBy"))
    }
}
