use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a course run, e.g. `course-v1:edX+DemoX+2024`.
///
/// Must be non-empty and free of NUL bytes, which the persistent store uses as
/// a key separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CourseId(String);

impl CourseId {
    pub fn new(id: &str) -> Result<Self, LedgerError> {
        let id = id.trim();
        if id.is_empty() || id.contains('\0') {
            Err(LedgerError::ValidationError(format!(
                "Invalid course id: {id:?}"
            )))
        } else {
            Ok(Self(id.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CourseId {
    type Error = LedgerError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<CourseId> for String {
    fn from(id: CourseId) -> Self {
        id.0
    }
}

impl fmt::Display for CourseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Cart,
    Purchased,
    Refunded,
}

/// One paid course registration inside an order.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct OrderItem {
    pub id: u64,
    pub course_id: CourseId,
    pub line_cost: Decimal,
}

/// A user's cart, which becomes a purchase record on checkout.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Order {
    pub id: u64,
    pub user_id: u64,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
}

impl Order {
    /// Opens an empty cart for the user.
    pub fn new(id: u64, user_id: u64) -> Self {
        Self {
            id,
            user_id,
            status: OrderStatus::Cart,
            items: Vec::new(),
        }
    }

    /// Adds a course registration to the cart.
    pub fn add_item(&mut self, item: OrderItem) -> Result<(), LedgerError> {
        if self.status != OrderStatus::Cart {
            return Err(LedgerError::ValidationError(format!(
                "Order {} is no longer a cart",
                self.id
            )));
        }
        if self.items.iter().any(|i| i.course_id == item.course_id) {
            return Err(LedgerError::ValidationError(format!(
                "Course {} is already in the cart of order {}",
                item.course_id, self.id
            )));
        }
        self.items.push(item);
        Ok(())
    }

    /// Checks the cart out.
    pub fn purchase(&mut self) -> Result<(), LedgerError> {
        match self.status {
            OrderStatus::Cart if !self.items.is_empty() => {
                self.status = OrderStatus::Purchased;
                Ok(())
            }
            OrderStatus::Cart => Err(LedgerError::ValidationError(format!(
                "Order {} has no items to purchase",
                self.id
            ))),
            status => Err(LedgerError::ValidationError(format!(
                "Order {} cannot be purchased from status {status:?}",
                self.id
            ))),
        }
    }

    /// Marks a purchased order as refunded.
    pub fn refund(&mut self) -> Result<(), LedgerError> {
        if self.status == OrderStatus::Purchased {
            self.status = OrderStatus::Refunded;
            Ok(())
        } else {
            Err(LedgerError::ValidationError(format!(
                "Order {} cannot be refunded from status {:?}",
                self.id, self.status
            )))
        }
    }

    pub fn item(&self, item_id: u64) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }
}
