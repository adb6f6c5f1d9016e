//! txquery - request-scoped transactions and query-string driven query shaping
//!
//! This crate sits between an HTTP layer and an ORM. For every inbound request
//! it parses the query-string options (`with`, `scopes`, `count`, `orderBy`,
//! `groupBy`, `paginate`, `exclude`) into a typed value, replays them onto a
//! query builder, and runs mutating repository operations inside transaction
//! scopes that are always closed, whichever way the request ends.
//!
//! # Example
//!
//! ```no_run
//! use txquery::config::Config;
//! use txquery::query::QueryPlan;
//! use txquery::request::{Request, RequestContext};
//! use txquery::store::MemoryStore;
//!
//! let ctx = RequestContext::new(
//!     Request::get("with=posts&sort=age|desc"),
//!     MemoryStore::new(),
//!     Config::default(),
//! );
//! let plan = ctx.shape(QueryPlan::new("users")).unwrap();
//! println!("{plan}");
//! ```

pub mod config;
pub mod logging;
pub mod query;
pub mod repository;
pub mod request;
pub mod store;
pub mod transaction;
