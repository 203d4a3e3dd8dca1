use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use std::io::Read;

/// Reads payment-processor transactions from a CSV source.
///
/// Expects the header
/// `remote_transaction_id,account_id,processed_at,order_id,currency,amount,type`
/// with RFC 3339 timestamps. Whitespace around fields is trimmed.
pub struct TransactionReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> TransactionReader<R> {
    /// Creates a new `TransactionReader` from any `Read` source (e.g., File, Stdin).
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Returns an iterator that lazily reads and deserializes transactions.
    ///
    /// A malformed row yields an `Err` for that row only; iteration continues.
    pub fn transactions(self) -> impl Iterator<Item = Result<Transaction>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }
}
