//! CSV adapters: order and transaction exports in, course totals out.

pub mod order_reader;
pub mod totals_writer;
pub mod transaction_reader;
