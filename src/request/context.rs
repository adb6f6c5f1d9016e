//! Per-request context.
//!
//! A `RequestContext` owns everything that lives exactly as long as one
//! request: the request itself, its parsed query options and its transaction
//! manager. Drop it when the request is done; any scope still open is rolled
//! back at that point.

use std::panic::{self, AssertUnwindSafe};

use tracing::Span;

use crate::config::Config;
use crate::logging::request_span;
use crate::query::{
    apply_options, apply_sort, PageRequest, QueryBuilder, QueryOptions, QueryResult,
};
use crate::repository::Dispatcher;
use crate::request::inbound::Request;
use crate::store::TransactionStore;
use crate::transaction::{FailureReport, TransactionManager};

/// Everything scoped to a single inbound request.
pub struct RequestContext<S: TransactionStore> {
    request: Request,
    options: QueryOptions,
    config: Config,
    transactions: TransactionManager<S>,
    span: Span,
}

impl<S: TransactionStore> RequestContext<S> {
    /// Start handling `request` against `store`.
    pub fn new(request: Request, store: S, config: Config) -> Self {
        let options = request.query_options();
        let transactions = TransactionManager::from_config(store, &config);
        let span = request_span(&transactions.id().to_string(), request.method().as_str());
        Self {
            request,
            options,
            config,
            transactions,
            span,
        }
    }

    pub fn request(&self) -> &Request {
        &self.request
    }

    pub fn options(&self) -> &QueryOptions {
        &self.options
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transactions(&self) -> &TransactionManager<S> {
        &self.transactions
    }

    pub fn span(&self) -> &Span {
        &self.span
    }

    /// Check if this request is exempt from transactions.
    pub fn is_read(&self) -> bool {
        self.config.is_read_method(self.request.method())
    }

    /// Dispatcher bound to this request's method and manager.
    pub fn dispatcher(&self) -> Dispatcher<'_, S> {
        Dispatcher::new(&self.transactions, self.is_read())
    }

    /// Apply the option pipeline, then the sort, to `query`.
    pub fn shape<Q: QueryBuilder>(&self, query: Q) -> QueryResult<Q> {
        let page = PageRequest::from_bag(self.request.query(), self.config.default_per_page);
        let query = apply_options(query, &self.options, page)?;
        apply_sort(query, self.request.sort(), &self.config.primary_key)
    }

    /// Run `handler` as the body of this request, then end the request.
    ///
    /// An error result goes through [`finish`](Self::finish). A panic is
    /// reported to the failure hook, which rolls back every open scope, and
    /// then resumes unwinding.
    #[track_caller]
    pub fn run<T, E, F>(self, handler: F) -> Result<T, E>
    where
        F: FnOnce(&Self) -> Result<T, E>,
        E: std::error::Error,
    {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| handler(&self)));
        match outcome {
            Ok(result) => self.finish(result),
            Err(payload) => {
                let report = FailureReport::from_panic(payload.as_ref());
                {
                    let _entered = self.span.enter();
                    self.transactions.handle_failure(&report);
                }
                drop(self);
                panic::resume_unwind(payload)
            }
        }
    }

    /// End the request. An error result goes through the failure hook first,
    /// so no scope outlives a failed request.
    #[track_caller]
    pub fn finish<T, E>(self, result: Result<T, E>) -> Result<T, E>
    where
        E: std::error::Error,
    {
        if let Err(e) = &result {
            let _entered = self.span.enter();
            self.transactions.handle_uncaught(e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Pagination, QueryPlan, QueryStep, SortDirection, SortSpec};
    use crate::logging::capture::{capture_events, errors};
    use crate::store::{MemoryStore, StoreCall, StoreError};
    use crate::transaction::TransactionError;

    #[test]
    fn test_read_detection_follows_config() {
        let ctx = RequestContext::new(Request::get(""), MemoryStore::new(), Config::default());
        assert!(ctx.is_read());

        let ctx = RequestContext::new(
            Request::parse(http::Method::HEAD, ""),
            MemoryStore::new(),
            Config::default().read_method(http::Method::HEAD),
        );
        assert!(ctx.is_read());

        let ctx = RequestContext::new(Request::post(""), MemoryStore::new(), Config::default());
        assert!(!ctx.is_read());
    }

    #[test]
    fn test_shape_runs_pipeline_then_sort() {
        let ctx = RequestContext::new(
            Request::get("sort=name|desc&with=posts"),
            MemoryStore::new(),
            Config::default(),
        );
        let plan = ctx.shape(QueryPlan::new("users")).unwrap();
        assert_eq!(
            plan.steps,
            vec![
                QueryStep::With {
                    relations: vec!["posts".into()]
                },
                QueryStep::OrderBy(SortSpec::new("name", SortDirection::Desc)),
            ]
        );
    }

    #[test]
    fn test_paginate_reads_per_page_and_page() {
        let ctx = RequestContext::new(
            Request::get("paginate=true&per_page=50&page=3"),
            MemoryStore::new(),
            Config::default(),
        );
        let plan = ctx.shape(QueryPlan::new("users")).unwrap();
        assert_eq!(plan.steps[0], QueryStep::Paginate(Pagination::new(50, 3)));

        let ctx = RequestContext::new(
            Request::get("paginate=true"),
            MemoryStore::new(),
            Config::default().default_per_page(25),
        );
        let plan = ctx.shape(QueryPlan::new("users")).unwrap();
        assert_eq!(plan.steps[0], QueryStep::Paginate(Pagination::new(25, 1)));
    }

    #[test]
    fn test_blank_sort_orders_by_primary_key() {
        for query in ["sort=", "orderBy=", "sort=&orderBy="] {
            let ctx =
                RequestContext::new(Request::get(query), MemoryStore::new(), Config::default());
            let plan = ctx.shape(QueryPlan::new("users")).unwrap();
            assert_eq!(
                plan.steps,
                vec![QueryStep::OrderBy(SortSpec::new("id", SortDirection::Asc))],
                "{query}"
            );
        }
    }

    #[test]
    fn test_finish_with_error_rolls_back() {
        let store = MemoryStore::new();
        let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());
        ctx.transactions().begin_transaction().unwrap();
        ctx.transactions().begin_transaction().unwrap();

        let result: Result<(), StoreError> = Err(StoreError::Connection("lost".into()));
        assert!(ctx.finish(result).is_err());

        assert_eq!(store.open_transactions(), 0);
        assert_eq!(store.journal().last(), Some(&StoreCall::Rollback));
    }

    #[test]
    fn test_finish_logs_failure_once() {
        let ctx = RequestContext::new(Request::post(""), MemoryStore::new(), Config::default());
        ctx.transactions().begin_transaction().unwrap();

        let result: Result<(), StoreError> = Err(StoreError::CommitRejected("locked".into()));
        let (_, events) = capture_events(|| ctx.finish(result));

        let failures = errors(&events);
        assert_eq!(failures.len(), 1);
        let failure = failures[0];
        let kind = failure.field("failure_kind").unwrap_or_default();
        assert!(kind.ends_with("StoreError"));
        let location = failure.field("source_location").unwrap_or_default();
        assert!(location.contains("context.rs:"));
    }

    #[test]
    fn test_run_returns_handler_result() {
        let store = MemoryStore::new();
        let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());
        let result = ctx.run(|ctx| {
            ctx.transactions()
                .transaction(|| Ok::<_, TransactionError>(ctx.options().is_empty()))
        });
        assert_eq!(result, Ok(true));
        assert_eq!(store.journal(), vec![StoreCall::Begin, StoreCall::Commit]);
    }

    #[test]
    fn test_run_reports_panic_and_rolls_back() {
        let store = MemoryStore::new();
        let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());

        let (outcome, events) = capture_events(|| {
            panic::catch_unwind(AssertUnwindSafe(|| {
                ctx.run(|ctx| -> Result<(), StoreError> {
                    ctx.transactions().begin_transaction().unwrap();
                    ctx.transactions().begin_transaction().unwrap();
                    panic!("handler exploded");
                })
            }))
        });

        assert!(outcome.is_err());
        assert_eq!(store.open_transactions(), 0);
        assert_eq!(
            store.journal(),
            vec![
                StoreCall::Begin,
                StoreCall::Savepoint("sp_2".into()),
                StoreCall::RollbackToSavepoint("sp_2".into()),
                StoreCall::Rollback,
            ]
        );

        let failures = errors(&events);
        assert_eq!(failures.len(), 1);
        let failure = failures[0];
        assert_eq!(failure.field("failure_kind"), Some("panic"));
        assert_eq!(failure.field("message"), Some("handler exploded"));
        let location = failure.field("source_location").unwrap_or_default();
        assert!(location.contains("context.rs:"));
    }

    #[test]
    fn test_finish_with_ok_leaves_state_alone() {
        let store = MemoryStore::new();
        let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());
        ctx.transactions().begin_transaction().unwrap();
        ctx.transactions().commit().unwrap();

        assert_eq!(ctx.finish(Ok::<_, StoreError>(5)), Ok(5));
        assert_eq!(store.journal(), vec![StoreCall::Begin, StoreCall::Commit]);
    }
}
