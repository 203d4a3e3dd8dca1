use crate::domain::order::{CourseId, Order};
use crate::domain::ports::{InsertOutcome, OrderStore, TransactionStore};
use crate::domain::transaction::{Transaction, TransactionCourseMapping};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, DB, Direction, IteratorMode, Options, WriteBatch};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Column Family for storing orders.
pub const CF_ORDERS: &str = "orders";
/// Column Family for storing transactions keyed by remote transaction id.
pub const CF_TRANSACTIONS: &str = "transactions";
/// Column Family for the course index: `course_id ‖ 0x00 ‖ remote_id` → mapping.
pub const CF_COURSE_MAPPINGS: &str = "course_mappings";

const KEY_SEPARATOR: u8 = 0;

/// A persistent store implementation using RocksDB.
///
/// Handles storage for orders, transactions and course mappings using
/// separate Column Families. Writes that must check for an existing key first
/// are serialised through `write_lock`, so two callers never both see a key as
/// absent.
///
/// This struct is thread-safe (`Clone` shares the underlying `Arc<DB>`).
#[derive(Clone)]
pub struct RocksDBStore {
    db: Arc<DB>,
    write_lock: Arc<Mutex<()>>,
}

impl RocksDBStore {
    /// Opens or creates a RocksDB instance at the specified path.
    ///
    /// Ensures that the required column families exist.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = [CF_ORDERS, CF_TRANSACTIONS, CF_COURSE_MAPPINGS]
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| LedgerError::StorageError(format!("Column family {name} not found")))
    }

    fn read<T: DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(cf, key)?
            .map(|bytes| serde_json::from_slice(&bytes).map_err(LedgerError::from))
            .transpose()
    }

    fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(value)?)
    }

    fn scan_mappings(&self, prefix: &[u8]) -> Result<Vec<TransactionCourseMapping>> {
        let cf = self.cf(CF_COURSE_MAPPINGS)?;
        let mut mappings = Vec::new();
        for item in self
            .db
            .iterator_cf(cf, IteratorMode::From(prefix, Direction::Forward))
        {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            mappings.push(serde_json::from_slice(&value)?);
        }
        Ok(mappings)
    }
}

fn course_prefix(course_id: &CourseId) -> Vec<u8> {
    let mut prefix = course_id.as_str().as_bytes().to_vec();
    prefix.push(KEY_SEPARATOR);
    prefix
}

fn mapping_key(mapping: &TransactionCourseMapping) -> Vec<u8> {
    let mut key = course_prefix(&mapping.course_id);
    key.extend_from_slice(mapping.transaction.remote_transaction_id.as_bytes());
    key
}

fn duplicate_mapping(mapping: &TransactionCourseMapping) -> LedgerError {
    LedgerError::IntegrityError(format!(
        "Transaction {} is already mapped to course {}",
        mapping.transaction.remote_transaction_id, mapping.course_id
    ))
}

#[async_trait]
impl OrderStore for RocksDBStore {
    async fn store(&self, order: Order) -> Result<()> {
        let cf = self.cf(CF_ORDERS)?;
        self.db
            .put_cf(cf, order.id.to_be_bytes(), Self::encode(&order)?)?;
        Ok(())
    }

    async fn get(&self, order_id: u64) -> Result<Option<Order>> {
        self.read(CF_ORDERS, &order_id.to_be_bytes())
    }
}

#[async_trait]
impl TransactionStore for RocksDBStore {
    async fn insert(
        &self,
        tx: Transaction,
        mappings: Vec<TransactionCourseMapping>,
    ) -> Result<InsertOutcome> {
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = self.read(CF_TRANSACTIONS, tx.remote_transaction_id.as_bytes())? {
            return Ok(InsertOutcome::Existing(existing));
        }

        let cf_transactions = self.cf(CF_TRANSACTIONS)?;
        let cf_mappings = self.cf(CF_COURSE_MAPPINGS)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(
            cf_transactions,
            tx.remote_transaction_id.as_bytes(),
            Self::encode(&tx)?,
        );
        let mut keys: Vec<Vec<u8>> = Vec::with_capacity(mappings.len());
        for mapping in &mappings {
            let key = mapping_key(mapping);
            if keys.contains(&key) || self.db.get_pinned_cf(cf_mappings, &key)?.is_some() {
                return Err(duplicate_mapping(mapping));
            }
            batch.put_cf(cf_mappings, &key, Self::encode(mapping)?);
            keys.push(key);
        }

        self.db.write(batch)?;
        Ok(InsertOutcome::Created)
    }

    async fn get(&self, remote_id: &str) -> Result<Option<Transaction>> {
        self.read(CF_TRANSACTIONS, remote_id.as_bytes())
    }

    async fn insert_mapping(&self, mapping: TransactionCourseMapping) -> Result<()> {
        let _guard = self.write_lock.lock().await;

        let remote_id = &mapping.transaction.remote_transaction_id;
        let cf_transactions = self.cf(CF_TRANSACTIONS)?;
        if self
            .db
            .get_pinned_cf(cf_transactions, remote_id.as_bytes())?
            .is_none()
        {
            return Err(LedgerError::NotFound(format!("transaction {remote_id}")));
        }

        let cf = self.cf(CF_COURSE_MAPPINGS)?;
        let key = mapping_key(&mapping);
        if self.db.get_pinned_cf(cf, &key)?.is_some() {
            return Err(duplicate_mapping(&mapping));
        }
        self.db.put_cf(cf, key, Self::encode(&mapping)?)?;
        Ok(())
    }

    async fn mappings_for_course(
        &self,
        course_id: &CourseId,
    ) -> Result<Vec<TransactionCourseMapping>> {
        self.scan_mappings(&course_prefix(course_id))
    }

    async fn all_mappings(&self) -> Result<Vec<TransactionCourseMapping>> {
        self.scan_mappings(&[])
    }
}
