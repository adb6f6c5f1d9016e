//! Base repository behavior.
//!
//! Implementors provide the request context, a fresh base query and their
//! operation table; reads and transaction-scoped dispatch come for free.

use crate::query::{Fetch, QueryBuilder, QueryField};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::operation::{Operation, OperationTable};
use crate::request::RequestContext;
use crate::store::TransactionStore;

/// A repository bound to one request.
pub trait Repository: Sized {
    type Store: TransactionStore;
    type Row;
    type Query: QueryBuilder + Fetch<Row = Self::Row, Error = RepositoryError>;
    type Args;
    type Output;

    fn context(&self) -> &RequestContext<Self::Store>;

    /// Unconstrained query over the repository's model.
    fn query(&self) -> Self::Query;

    fn operations(&self) -> &OperationTable<Self, Self::Args, Self::Output>;

    /// Fetch one row. Only `with` is applied to single-item reads.
    fn item(&self, query: Self::Query) -> RepositoryResult<Option<Self::Row>> {
        let options = self.context().options();
        let query = if options.has(QueryField::With) {
            query.with(&options.as_list(QueryField::With))
        } else {
            query
        };
        query.first()
    }

    /// Fetch rows shaped by every query option and the sort.
    fn collection(&self, query: Self::Query) -> RepositoryResult<Vec<Self::Row>> {
        self.context().shape(query)?.get()
    }

    /// Fetch the row whose primary key equals `id`.
    fn find(&self, id: &str) -> RepositoryResult<Option<Self::Row>> {
        let primary_key = &self.context().config().primary_key;
        self.item(self.query().where_eq(primary_key, id))
    }

    /// Fetch every row of the model.
    fn all(&self) -> RepositoryResult<Vec<Self::Row>> {
        self.collection(self.query())
    }

    /// Run a named operation, inside a transaction unless the request is a read.
    fn dispatch(&self, name: &str, args: Self::Args) -> RepositoryResult<Self::Output> {
        self.context()
            .dispatcher()
            .dispatch(self.operations(), self, name, args)
    }

    fn store(&self, args: Self::Args) -> RepositoryResult<Self::Output> {
        self.dispatch(Operation::Store.name(), args)
    }

    fn update(&self, args: Self::Args) -> RepositoryResult<Self::Output> {
        self.dispatch(Operation::Update.name(), args)
    }

    fn delete(&self, args: Self::Args) -> RepositoryResult<Self::Output> {
        self.dispatch(Operation::Delete.name(), args)
    }
}
