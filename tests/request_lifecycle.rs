//! End-to-end request handling: parse, shape, dispatch, finish.

use http::Method;

use txquery::config::Config;
use txquery::query::{QueryField, QueryPlan, QueryStep, ScopeSpec, SortDirection, SortSpec};
use txquery::repository::{Operation, OperationTable, RepositoryError, RepositoryResult};
use txquery::request::{Request, RequestContext};
use txquery::store::{MemoryStore, StoreCall};
use txquery::transaction::{NestingMode, TransactionError};

struct Invoices;

fn operations() -> OperationTable<Invoices, u32, u32> {
    OperationTable::new()
        .register(Operation::Store, |_, amount| Ok(amount))
        .register(Operation::Update, |_, amount| {
            if amount == 0 {
                Err(RepositoryError::Operation("amount must be positive".into()))
            } else {
                Ok(amount)
            }
        })
}

#[test]
fn failing_mutation_leaves_no_open_scope() {
    let store = MemoryStore::new();
    let ctx = RequestContext::new(
        Request::parse(Method::PUT, "with=lines"),
        store.clone(),
        Config::default(),
    );

    let before = ctx.transactions().active_count();
    let result = ctx
        .dispatcher()
        .run(&operations(), &Invoices, Operation::Update, 0);

    assert!(matches!(result, Err(RepositoryError::Operation(_))));
    assert_eq!(ctx.transactions().active_count(), before);
    assert_eq!(store.count(&StoreCall::Rollback), 1);
    assert_eq!(store.count(&StoreCall::Commit), 0);

    assert!(ctx.finish(result).is_err());
    assert_eq!(store.open_transactions(), 0);
    assert_eq!(store.count(&StoreCall::Rollback), 1);
}

#[test]
fn unhandled_failure_closes_manually_opened_scopes() {
    let store = MemoryStore::new();
    let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());

    let result: RepositoryResult<u32> = (|| {
        ctx.transactions().begin_transaction()?;
        ctx.transactions().begin_transaction()?;
        Err(RepositoryError::Operation("handler gave up".into()))
    })();

    assert_eq!(ctx.transactions().active_count(), 2);
    assert!(ctx.finish(result).is_err());

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
}

#[test]
fn read_request_never_touches_transactions() {
    let store = MemoryStore::new();
    let ctx = RequestContext::new(
        Request::get("scopes=%7B%22active%22%3A%5B%5D%2C%22byMonth%22%3A%5B3%5D%7D&sort=total|desc"),
        store.clone(),
        Config::default(),
    );

    assert_eq!(
        ctx.dispatcher().run(&operations(), &Invoices, Operation::Store, 10),
        Ok(10)
    );

    let plan = ctx.shape(QueryPlan::new("invoices")).unwrap();
    let QueryStep::Scopes { scopes } = &plan.steps[0] else {
        panic!("expected scopes first, got {:?}", plan.steps);
    };
    assert_eq!(scopes.names(), vec!["active", "byMonth"]);
    assert_eq!(
        plan.sorts(),
        vec![&SortSpec::new("total", SortDirection::Desc)]
    );

    assert!(store.journal().is_empty());
}

#[test]
fn structured_lists_pass_through_untouched() {
    let ctx = RequestContext::new(
        Request::get("with[]=lines&with[]=customer.address&scopes[]=open"),
        MemoryStore::new(),
        Config::default(),
    );

    assert_eq!(
        ctx.options().as_list(QueryField::With),
        vec!["lines", "customer.address"]
    );
    let plan = ctx.shape(QueryPlan::new("invoices")).unwrap();
    assert_eq!(
        plan.steps[1],
        QueryStep::Scopes {
            scopes: ScopeSpec::parse("open")
        }
    );
    assert_eq!(plan.sorts(), vec![&SortSpec::new("id", SortDirection::Asc)]);
}

#[test]
fn flat_nesting_turns_inner_failure_into_outer_rollback() {
    let store = MemoryStore::without_savepoints();
    let ctx = RequestContext::new(
        Request::post(""),
        store.clone(),
        Config::default().nesting(NestingMode::Savepoints),
    );
    assert_eq!(ctx.transactions().nesting(), NestingMode::Flat);

    let result: RepositoryResult<u32> = ctx.transactions().transaction(|| {
        let inner = ctx
            .dispatcher()
            .run(&operations(), &Invoices, Operation::Update, 0);
        assert!(inner.is_err());
        Ok(1)
    });

    assert_eq!(
        result,
        Err(RepositoryError::Transaction(TransactionError::RollbackOnly))
    );
    assert_eq!(store.journal(), vec![StoreCall::Begin, StoreCall::Rollback]);
}

#[test]
fn store_failure_on_begin_propagates() {
    let store = MemoryStore::new();
    store.fail_next_begin();
    let ctx = RequestContext::new(Request::post(""), store.clone(), Config::default());

    let result = ctx
        .dispatcher()
        .run(&operations(), &Invoices, Operation::Store, 5);

    assert!(matches!(
        result,
        Err(RepositoryError::Transaction(TransactionError::Store(_)))
    ));
    assert_eq!(ctx.transactions().active_count(), 0);
    assert!(store.journal().is_empty());
}
