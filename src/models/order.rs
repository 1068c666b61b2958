use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::OrderStatus;

/// Customer order with its line items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default)]
    pub total: Decimal,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
}

/// Single line of an order
///
/// `order_id` is the back-reference to the owning order. It must point at the
/// containing order before the order is saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<u64>,
    #[serde(default)]
    pub order_id: Option<u64>,
    pub product_id: u64,
    pub quantity: u32,
}

impl Order {
    /// Point every item's back-reference at this order
    pub fn link_items(&mut self) {
        let order_id = self.id;
        for item in &mut self.items {
            item.order_id = order_id;
        }
    }

    /// Record the id handed out by the persistence layer and relink the items
    pub fn assign_id(&mut self, id: u64) {
        self.id = Some(id);
        self.link_items();
    }

    /// Drop any client supplied identity so persistence can assign fresh ids
    pub fn clear_ids(&mut self) {
        self.id = None;
        self.created_at = None;
        for item in &mut self.items {
            item.id = None;
            item.order_id = None;
        }
    }

    /// Whether every item references this order
    pub fn items_linked(&self) -> bool {
        self.items.iter().all(|item| item.order_id == self.id)
    }
}

impl OrderItem {
    pub fn new(product_id: u64, quantity: u32) -> Self {
        Self {
            id: None,
            order_id: None,
            product_id,
            quantity,
        }
    }
}
