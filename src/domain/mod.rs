//! Domain model: orders, payment transactions and their course mappings, plus
//! the storage ports the application layer depends on.

pub mod money;
pub mod order;
pub mod ports;
pub mod transaction;
