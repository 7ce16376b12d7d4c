//! Artisan order notifications.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{NotificationId, NotificationStatus, OrderId, UserId};

/// A notification document (`notifications` collection).
///
/// One is written per order line item at checkout, addressed to the product's
/// owner. The only mutation afterwards is flipping `status` to read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: NotificationId,
    /// The artisan this notification is addressed to.
    pub artisan_id: UserId,
    pub order_id: OrderId,
    pub product_name: String,
    pub quantity: u32,
    pub buyer_name: String,
    pub timestamp: DateTime<Utc>,
    pub status: NotificationStatus,
}
