use crate::domain::order::{CourseId, Order};
use crate::domain::ports::{InsertOutcome, OrderStore, TransactionStore};
use crate::domain::transaction::{Transaction, TransactionCourseMapping};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tokio::sync::RwLock;

/// A thread-safe in-memory store for orders.
///
/// Uses `Arc<RwLock<HashMap<u64, Order>>>` to allow shared concurrent access.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<u64, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates a new, empty in-memory order store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn store(&self, order: Order) -> Result<()> {
        let mut orders = self.orders.write().await;
        orders.insert(order.id, order);
        Ok(())
    }

    async fn get(&self, order_id: u64) -> Result<Option<Order>> {
        let orders = self.orders.read().await;
        Ok(orders.get(&order_id).cloned())
    }
}

#[derive(Default)]
struct Tables {
    transactions: HashMap<String, Transaction>,
    /// Keyed by (course, remote transaction id) so a course is a range scan.
    mappings: BTreeMap<(CourseId, String), TransactionCourseMapping>,
}

/// A thread-safe in-memory ledger of transactions and their course mappings.
///
/// Both tables sit behind one lock so that the uniqueness check and the
/// writes of [`TransactionStore::insert`] happen as a single step.
#[derive(Default, Clone)]
pub struct InMemoryTransactionStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryTransactionStore {
    /// Creates a new, empty in-memory transaction store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn mapping_key(mapping: &TransactionCourseMapping) -> (CourseId, String) {
    (
        mapping.course_id.clone(),
        mapping.transaction.remote_transaction_id.clone(),
    )
}

fn duplicate_mapping(mapping: &TransactionCourseMapping) -> LedgerError {
    LedgerError::IntegrityError(format!(
        "Transaction {} is already mapped to course {}",
        mapping.transaction.remote_transaction_id, mapping.course_id
    ))
}

#[async_trait]
impl TransactionStore for InMemoryTransactionStore {
    async fn insert(
        &self,
        tx: Transaction,
        mappings: Vec<TransactionCourseMapping>,
    ) -> Result<InsertOutcome> {
        let mut tables = self.tables.write().await;

        if let Some(existing) = tables.transactions.get(&tx.remote_transaction_id) {
            return Ok(InsertOutcome::Existing(existing.clone()));
        }
        let mut keys = Vec::with_capacity(mappings.len());
        for mapping in &mappings {
            let key = mapping_key(mapping);
            if tables.mappings.contains_key(&key) || keys.contains(&key) {
                return Err(duplicate_mapping(mapping));
            }
            keys.push(key);
        }

        tables
            .transactions
            .insert(tx.remote_transaction_id.clone(), tx);
        for (key, mapping) in keys.into_iter().zip(mappings) {
            tables.mappings.insert(key, mapping);
        }
        Ok(InsertOutcome::Created)
    }

    async fn get(&self, remote_id: &str) -> Result<Option<Transaction>> {
        let tables = self.tables.read().await;
        Ok(tables.transactions.get(remote_id).cloned())
    }

    async fn insert_mapping(&self, mapping: TransactionCourseMapping) -> Result<()> {
        let mut tables = self.tables.write().await;
        let remote_id = &mapping.transaction.remote_transaction_id;
        if !tables.transactions.contains_key(remote_id) {
            return Err(LedgerError::NotFound(format!("transaction {remote_id}")));
        }
        let key = mapping_key(&mapping);
        if tables.mappings.contains_key(&key) {
            return Err(duplicate_mapping(&mapping));
        }
        tables.mappings.insert(key, mapping);
        Ok(())
    }

    async fn mappings_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<TransactionCourseMapping>> {
        let tables = self.tables.read().await;
        Ok(tables
            .mappings
            .range((course_id.clone(), String::new())..)
            .take_while(|((course, _), _)| course == course_id)
            .map(|(_, mapping)| mapping.clone())
            .collect())
    }

    async fn all_mappings(&self) -> Result<Vec<TransactionCourseMapping>> {
        let tables = self.tables.read().await;
        Ok(tables.mappings.values().cloned().collect())
    }
}
