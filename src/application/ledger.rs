use crate::domain::order::{CourseId, Order, OrderStatus};
use crate::domain::ports::{InsertOutcome, OrderStoreBox, TransactionStoreBox};
use crate::domain::transaction::{
    CourseTotals, Transaction, TransactionCourseMapping, TransactionType,
};
use crate::error::{LedgerError, Result};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Ledger of payment-processor transactions and the courses they paid for.
///
/// `TransactionLedger` owns the storage backends. Each recorded transaction is
/// mapped onto the items of its order in the same atomic insert, so totals per
/// course never see a transaction without its mappings.
pub struct TransactionLedger {
    order_store: OrderStoreBox,
    transaction_store: TransactionStoreBox,
}

impl TransactionLedger {
    /// Creates a new `TransactionLedger` instance.
    ///
    /// # Arguments
    ///
    /// * `order_store` - The store for orders and their items.
    /// * `transaction_store` - The store for transactions and course mappings.
    pub fn new(order_store: OrderStoreBox, transaction_store: TransactionStoreBox) -> Self {
        Self {
            order_store,
            transaction_store,
        }
    }

    /// Stores or replaces an order.
    pub async fn save_order(&self, order: Order) -> Result<()> {
        self.order_store.store(order).await
    }

    /// Looks up an order by id.
    pub async fn order(&self, order_id: u64) -> Result<Option<Order>> {
        self.order_store.get(order_id).await
    }

    /// Looks up a recorded transaction by its remote id.
    pub async fn transaction(&self, remote_id: &str) -> Result<Option<Transaction>> {
        self.transaction_store.get(remote_id).await
    }

    /// Records a transaction reported by the payment processor.
    ///
    /// Re-submitting identical data for a known remote id returns the stored
    /// record and writes nothing. Any differing field, `order_id` included, is
    /// rejected with `IntegrityError` before the order is looked at.
    pub async fn record(&self, tx: Transaction) -> Result<Transaction> {
        if let Some(existing) = self.transaction_store.get(&tx.remote_transaction_id).await? {
            return replay(tx, existing);
        }

        let order = self
            .order_store
            .get(tx.order_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("order {}", tx.order_id)))?;

        if order.status == OrderStatus::Cart {
            return Err(LedgerError::ValidationError(format!(
                "Order {} has not been checked out",
                order.id
            )));
        }

        let mappings = TransactionCourseMapping::for_order(&tx, &order)?;
        match self.transaction_store.insert(tx.clone(), mappings).await? {
            InsertOutcome::Created => {
                info!(
                    remote_id = %tx.remote_transaction_id,
                    order_id = tx.order_id,
                    amount = %tx.amount,
                    currency = %tx.currency,
                    transaction_type = ?tx.transaction_type,
                    "Recorded transaction"
                );
                Ok(tx)
            }
            // Another caller recorded the same remote id in between.
            InsertOutcome::Existing(existing) => replay(tx, existing),
        }
    }

    /// Maps a recorded transaction onto a course explicitly.
    ///
    /// The order item must belong to the transaction's order and carry
    /// `course_id`. The course receives the item's share of the amount, split
    /// the same way as in [`TransactionLedger::record`].
    pub async fn map_to_course(
        &self,
        remote_id: &str,
        course_id: CourseId,
        order_item_id: u64,
    ) -> Result<TransactionCourseMapping> {
        let transaction = self
            .transaction_store
            .get(remote_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("transaction {remote_id}")))?;

        let order = self
            .order_store
            .get(transaction.order_id)
            .await?
            .ok_or_else(|| LedgerError::NotFound(format!("order {}", transaction.order_id)))?;
        let item = order.item(order_item_id).ok_or_else(|| {
            LedgerError::ValidationError(format!(
                "Order item {order_item_id} does not belong to order {}",
                order.id
            ))
        })?;
        if item.course_id != course_id {
            return Err(LedgerError::ValidationError(format!(
                "Order item {order_item_id} is for course {}, not {course_id}",
                item.course_id
            )));
        }

        let mapping = TransactionCourseMapping::for_order(&transaction, &order)?
            .into_iter()
            .find(|m| m.order_item_id == order_item_id)
            .ok_or_else(|| {
                LedgerError::ValidationError(format!(
                    "Order item {order_item_id} does not belong to order {}",
                    order.id
                ))
            })?;
        self.transaction_store.insert_mapping(mapping.clone()).await?;
        Ok(mapping)
    }

    /// Returns the mappings of one course, oldest transaction first.
    ///
    /// The optional type filter is applied lazily as the sequence is consumed.
    pub async fn transactions_for_course(
        &self,
        course_id: &CourseId,
        transaction_type: Option<TransactionType>,
    ) -> Result<CourseTransactions> {
        let mut mappings = self.transaction_store.mappings_for_course(course_id).await?;
        mappings.sort_by(|a, b| {
            (a.transaction.processed_at, &a.transaction.remote_transaction_id)
                .cmp(&(b.transaction.processed_at, &b.transaction.remote_transaction_id))
        });
        Ok(CourseTransactions {
            mappings: mappings.into_iter(),
            transaction_type,
        })
    }

    /// Sums the purchased and refunded amounts attributed to one course.
    pub async fn totals_for_course(
        &self,
        course_id: &CourseId,
        transaction_type: Option<TransactionType>,
    ) -> Result<CourseTotals> {
        let mappings = self.transaction_store.mappings_for_course(course_id).await?;
        mappings
            .iter()
            .filter(|m| matches_type(m, transaction_type))
            .try_fold(CourseTotals::default(), |mut totals, m| {
                totals.add(m)?;
                Ok(totals)
            })
    }

    /// Sums every course with at least one mapping matching the type filter,
    /// ordered by course id.
    pub async fn totals_by_course(
        &self,
        transaction_type: Option<TransactionType>,
    ) -> Result<BTreeMap<CourseId, CourseTotals>> {
        let mut totals: BTreeMap<CourseId, CourseTotals> = BTreeMap::new();
        for mapping in self.transaction_store.all_mappings().await? {
            if matches_type(&mapping, transaction_type) {
                totals
                    .entry(mapping.course_id.clone())
                    .or_default()
                    .add(&mapping)?;
            }
        }
        Ok(totals)
    }
}

fn replay(tx: Transaction, existing: Transaction) -> Result<Transaction> {
    if existing == tx {
        debug!(remote_id = %tx.remote_transaction_id, "Transaction already recorded");
        return Ok(existing);
    }
    warn!(
        remote_id = %tx.remote_transaction_id,
        "Rejected transaction conflicting with recorded data"
    );
    Err(LedgerError::IntegrityError(format!(
        "Transaction {} is already recorded with different data (order {}, amount {} {})",
        existing.remote_transaction_id, existing.order_id, existing.amount, existing.currency
    )))
}

/// Lazy sequence of one course's mappings, see
/// [`TransactionLedger::transactions_for_course`].
pub struct CourseTransactions {
    mappings: std::vec::IntoIter<TransactionCourseMapping>,
    transaction_type: Option<TransactionType>,
}

impl Iterator for CourseTransactions {
    type Item = TransactionCourseMapping;

    fn next(&mut self) -> Option<Self::Item> {
        let filter = self.transaction_type;
        self.mappings.find(|m| matches_type(m, filter))
    }
}

fn matches_type(mapping: &TransactionCourseMapping, filter: Option<TransactionType>) -> bool {
    filter.is_none_or(|t| mapping.transaction.transaction_type == t)
}
