use super::money::{Amount, Currency};
use super::order::{CourseId, Order};
use crate::error::LedgerError;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Purchase,
    Refund,
}

/// A payment or refund confirmed by the external payment processor.
///
/// Identified by `remote_transaction_id`; once recorded it is never mutated.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub remote_transaction_id: String,
    pub account_id: String,
    pub processed_at: DateTime<Utc>,
    pub order_id: u64,
    pub currency: Currency,
    pub amount: Amount,
    #[serde(rename = "type")]
    pub transaction_type: TransactionType,
}

/// Links a transaction to one course it paid for, through the order item that
/// carried the course.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct TransactionCourseMapping {
    pub transaction: Transaction,
    pub course_id: CourseId,
    pub order_item_id: u64,
    /// Share of the transaction amount attributed to this course.
    pub amount: Decimal,
}

impl TransactionCourseMapping {
    /// Builds one mapping per item of `order`.
    ///
    /// The amount is split in proportion to line costs (equally when every line
    /// is free) and rounded to the amount's scale. The last item absorbs the
    /// rounding remainder so the shares always add up to the full amount.
    pub fn for_order(transaction: &Transaction, order: &Order) -> Result<Vec<Self>, LedgerError> {
        let amount = transaction.amount.value();
        let scale = amount.scale();

        let weights: Vec<Decimal> = if order.items.iter().all(|i| i.line_cost <= Decimal::ZERO) {
            vec![Decimal::ONE; order.items.len()]
        } else {
            order
                .items
                .iter()
                .map(|i| i.line_cost.max(Decimal::ZERO))
                .collect()
        };
        let total_weight = weights
            .iter()
            .try_fold(Decimal::ZERO, |sum, w| sum.checked_add(*w))
            .ok_or_else(|| overflow(format!("line costs of order {}", order.id)))?;

        let last = order.items.len().saturating_sub(1);
        let mut remaining = amount;
        let mut mappings = Vec::with_capacity(order.items.len());
        for (idx, (item, weight)) in order.items.iter().zip(weights).enumerate() {
            let share = if idx == last {
                remaining
            } else {
                // Ratio first: it is at most one, so the product cannot exceed the amount.
                weight
                    .checked_div(total_weight)
                    .and_then(|ratio| amount.checked_mul(ratio))
                    .ok_or_else(|| {
                        overflow(format!(
                            "split of transaction {}",
                            transaction.remote_transaction_id
                        ))
                    })?
                    .round_dp(scale)
                    .min(remaining)
            };
            remaining -= share;
            mappings.push(Self {
                transaction: transaction.clone(),
                course_id: item.course_id.clone(),
                order_item_id: item.id,
                amount: share,
            });
        }
        Ok(mappings)
    }
}

fn overflow(what: String) -> LedgerError {
    LedgerError::ValidationError(format!("Decimal overflow in {what}"))
}

/// Purchased and refunded sums for one course.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy, Default)]
pub struct CourseTotals {
    pub purchased: Decimal,
    pub refunded: Decimal,
}

impl CourseTotals {
    pub fn add(&mut self, mapping: &TransactionCourseMapping) -> Result<(), LedgerError> {
        let sum = match mapping.transaction.transaction_type {
            TransactionType::Purchase => &mut self.purchased,
            TransactionType::Refund => &mut self.refunded,
        };
        *sum = sum
            .checked_add(mapping.amount)
            .ok_or_else(|| overflow(format!("totals of course {}", mapping.course_id)))?;
        Ok(())
    }
}
