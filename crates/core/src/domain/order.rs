use std::sync::atomic::{AtomicI64, Ordering};

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderId(pub String);

impl OrderId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Assigned,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Assigned => "assigned",
        }
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "pending" => Ok(Self::Pending),
            "assigned" => Ok(Self::Assigned),
            other => Err(DomainError::InvariantViolation(format!(
                "unknown order status `{other}`"
            ))),
        }
    }
}

/// A cart line. `unit_price` is a snapshot taken when the line was parsed;
/// later catalog changes never reprice an existing cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub name: String,
    pub quantity: u32,
    pub unit_price: Decimal,
}

impl LineItem {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerInfo {
    pub name: String,
    pub address: String,
    pub payment_method: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub customer_id: String,
    pub line_items: Vec<LineItem>,
    pub customer: CustomerInfo,
    pub status: OrderStatus,
    pub vendor_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
}

impl Order {
    pub fn total(&self) -> Decimal {
        self.line_items.iter().map(LineItem::line_total).sum()
    }

    /// One-shot PENDING -> ASSIGNED transition. The durable stores enforce
    /// the same rule with a conditional update; this is the in-memory twin.
    pub fn assign(&mut self, vendor_id: &str, at: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status != OrderStatus::Pending {
            return Err(DomainError::InvalidOrderTransition {
                from: self.status,
                to: OrderStatus::Assigned,
            });
        }

        self.status = OrderStatus::Assigned;
        self.vendor_id = Some(vendor_id.to_owned());
        self.assigned_at = Some(at);
        Ok(())
    }
}

/// Allocates `ORD-<millis>` ids. The ratchet keeps ids strictly increasing
/// even when two orders are placed within the same millisecond, so creation
/// order is always recoverable from the id alone.
#[derive(Debug, Default)]
pub struct OrderIdGenerator {
    last: AtomicI64,
}

impl OrderIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next(&self, now: DateTime<Utc>) -> OrderId {
        let millis = now.timestamp_millis();
        let mut previous = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = millis.max(previous + 1);
            match self.last.compare_exchange_weak(
                previous,
                candidate,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => return OrderId(format!("ORD-{candidate}")),
                Err(actual) => previous = actual,
            }
        }
    }
}
