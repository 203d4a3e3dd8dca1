use super::order::{CourseId, Order};
use super::transaction::{Transaction, TransactionCourseMapping};
use crate::error::Result;
use async_trait::async_trait;

/// Outcome of an insert-if-absent on the transaction store.
#[derive(Debug, PartialEq, Clone)]
pub enum InsertOutcome {
    Created,
    /// A transaction with the same remote id was already stored; nothing was written.
    Existing(Transaction),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    async fn store(&self, order: Order) -> Result<()>;
    async fn get(&self, order_id: u64) -> Result<Option<Order>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    /// Atomically stores `tx` and its course mappings unless its remote id is taken.
    ///
    /// A mapping that collides with an existing (transaction, course) pair fails
    /// the whole insert with `IntegrityError`.
    async fn insert(
        &self,
        tx: Transaction,
        mappings: Vec<TransactionCourseMapping>,
    ) -> Result<InsertOutcome>;
    async fn get(&self, remote_id: &str) -> Result<Option<Transaction>>;
    /// Fails with `NotFound` when the transaction was never recorded and with
    /// `IntegrityError` when the (transaction, course) pair is already mapped.
    async fn insert_mapping(&self, mapping: TransactionCourseMapping) -> Result<()>;
    async fn mappings_for_course(&self, course_id: &CourseId)
    -> Result<Vec<TransactionCourseMapping>>;
    async fn all_mappings(&self) -> Result<Vec<TransactionCourseMapping>>;
}

pub type OrderStoreBox = Box<dyn OrderStore>;
pub type TransactionStoreBox = Box<dyn TransactionStore>;
