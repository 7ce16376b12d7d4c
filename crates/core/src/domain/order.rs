//! Order documents and line-item snapshots.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{OrderId, OrderStatus, ProductId, UserId};

/// A line item captured at purchase time.
///
/// Title and price are snapshots: later edits to the source product never
/// change an existing order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub quantity: u32,
}

impl OrderItem {
    /// Line total (`price * quantity`).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// An order document (`orders` collection).
///
/// Immutable after creation except for [`OrderStatus`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    /// The buyer who placed the order.
    pub user_id: UserId,
    pub items: Vec<OrderItem>,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub status: OrderStatus,
}

impl Order {
    /// Sum of the line totals; equals `total_amount` for well-formed orders.
    #[must_use]
    pub fn items_total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_line_and_items_total() {
        let order = Order {
            id: OrderId::new("o1"),
            user_id: UserId::new("u1"),
            items: vec![
                OrderItem {
                    product_id: ProductId::new("p1"),
                    title: "Pot".to_owned(),
                    price: dec!(250),
                    quantity: 1,
                },
                OrderItem {
                    product_id: ProductId::new("p2"),
                    title: "Scarf".to_owned(),
                    price: dec!(100),
                    quantity: 2,
                },
            ],
            total_amount: dec!(450),
            order_date: Utc::now(),
            status: OrderStatus::Processing,
        };

        assert_eq!(order.items[1].line_total(), dec!(200));
        assert_eq!(order.items_total(), order.total_amount);
    }
}
