//! Order delivery status.

use serde::{Deserialize, Serialize};

/// Delivery status of an order.
///
/// Stored as the `is_delivered` boolean column; an order moves from
/// `Pending` to `Delivered` once and never back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
}

impl DeliveryStatus {
    /// Map the `is_delivered` column to a status.
    #[must_use]
    pub const fn from_delivered(is_delivered: bool) -> Self {
        if is_delivered {
            Self::Delivered
        } else {
            Self::Pending
        }
    }

    /// Whether the order has been delivered.
    #[must_use]
    pub const fn is_delivered(self) -> bool {
        matches!(self, Self::Delivered)
    }

    /// Human readable label used in API responses.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Delivered => "Delivered",
        }
    }
}

impl std::fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
