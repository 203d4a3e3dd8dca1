mod common;

use tempfile::tempdir;

#[test]
fn test_generated_purchases_cover_every_order() {
    let dir = tempdir().unwrap();
    let orders = dir.path().join("orders.csv");
    let transactions = dir.path().join("transactions.csv");
    let courses = [("course-a", "40.50"), ("course-b", "100.00")];

    common::generate_orders(&orders, &courses, 5).expect("Failed to generate orders");
    common::generate_shuffled_purchases(&transactions, &courses, 5)
        .expect("Failed to generate transactions");

    // Header + 10 rows each
    let content = std::fs::read_to_string(&orders).unwrap();
    assert_eq!(content.lines().count(), 11);

    let mut reader = csv::Reader::from_path(&transactions).unwrap();
    let mut order_ids: Vec<u64> = reader
        .records()
        .map(|r| r.unwrap()[3].parse().unwrap())
        .collect();
    order_ids.sort_unstable();
    assert_eq!(order_ids, (1..=10).collect::<Vec<u64>>());
}
