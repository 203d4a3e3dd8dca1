//! Application layer containing the ledger orchestration.
//!
//! `TransactionLedger` is the entry point for recording payment-processor
//! callbacks and querying per-course totals. It owns the storage ports and
//! leaves uniqueness enforcement to the transaction store's atomic insert.

pub mod ledger;
