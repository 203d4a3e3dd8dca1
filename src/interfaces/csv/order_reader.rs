use crate::domain::order::{CourseId, Order, OrderItem, OrderStatus};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::io::Read;

/// One row of an order export: a single item of an order.
#[derive(Debug, Deserialize, PartialEq, Clone)]
pub struct OrderLine {
    pub order_id: u64,
    pub user_id: u64,
    pub status: OrderStatus,
    pub item_id: u64,
    pub course_id: CourseId,
    pub line_cost: Decimal,
}

/// Reads orders from a CSV export with the header
/// `order_id,user_id,status,item_id,course_id,line_cost`.
pub struct OrderReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> OrderReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    pub fn lines(self) -> impl Iterator<Item = Result<OrderLine>> {
        self.reader
            .into_deserialize()
            .map(|result| result.map_err(LedgerError::from))
    }

    /// Folds the rows into orders, ordered by order id.
    ///
    /// Rows of one order must agree on user and status. The status is reached
    /// through the order's own transitions, so a `refunded` order is built as a
    /// cart that was purchased and then refunded.
    pub fn orders(self) -> Result<Vec<Order>> {
        let mut carts: BTreeMap<u64, (Order, OrderStatus)> = BTreeMap::new();
        for line in self.lines() {
            let line = line?;
            let (order, status) = carts
                .entry(line.order_id)
                .or_insert_with(|| (Order::new(line.order_id, line.user_id), line.status));
            if order.user_id != line.user_id || *status != line.status {
                return Err(LedgerError::ValidationError(format!(
                    "Order {} has rows with conflicting user or status",
                    line.order_id
                )));
            }
            order.add_item(OrderItem {
                id: line.item_id,
                course_id: line.course_id,
                line_cost: line.line_cost,
            })?;
        }

        carts
            .into_values()
            .map(|(mut order, status)| -> Result<Order> {
                match status {
                    OrderStatus::Cart => {}
                    OrderStatus::Purchased => order.purchase()?,
                    OrderStatus::Refunded => {
                        order.purchase()?;
                        order.refund()?;
                    }
                }
                Ok(order)
            })
            .collect()
    }
}
