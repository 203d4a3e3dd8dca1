#![allow(dead_code)]

use rand::seq::SliceRandom;
use std::fs::File;
use std::io::Error;
use std::path::Path;

pub const ORDERS_HEADER: [&str; 6] = [
    "order_id",
    "user_id",
    "status",
    "item_id",
    "course_id",
    "line_cost",
];

pub const TRANSACTIONS_HEADER: [&str; 7] = [
    "remote_transaction_id",
    "account_id",
    "processed_at",
    "order_id",
    "currency",
    "amount",
    "type",
];

/// Writes `orders_per_course` single-item purchased orders for each course,
/// numbering orders consecutively across courses.
pub fn generate_orders(path: &Path, courses: &[(&str, &str)], orders_per_course: usize) -> Result<(), Error> {
    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(ORDERS_HEADER)?;

    let mut order_id = 1;
    for &(course, cost) in courses {
        for _ in 0..orders_per_course {
            let id = order_id.to_string();
            wtr.write_record([id.as_str(), "1", "purchased", id.as_str(), course, cost])?;
            order_id += 1;
        }
    }

    wtr.flush()?;
    Ok(())
}

/// Writes one purchase per order generated by [`generate_orders`], in random order
/// so that courses interleave.
pub fn generate_shuffled_purchases(
    path: &Path,
    courses: &[(&str, &str)],
    orders_per_course: usize,
) -> Result<(), Error> {
    let mut rows = Vec::new();
    let mut order_id = 1;
    for &(_, cost) in courses {
        for _ in 0..orders_per_course {
            rows.push((order_id, cost.to_string()));
            order_id += 1;
        }
    }
    rows.shuffle(&mut rand::thread_rng());

    let file = File::create(path)?;
    let mut wtr = csv::WriterBuilder::new().from_writer(file);
    wtr.write_record(TRANSACTIONS_HEADER)?;
    for (order_id, cost) in rows {
        let remote_id = format!("remote-{order_id}");
        let order_id = order_id.to_string();
        wtr.write_record([
            remote_id.as_str(),
            "acct-1",
            "2024-03-01T10:00:00Z",
            order_id.as_str(),
            "USD",
            cost.as_str(),
            "purchase",
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
