use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VendorId(pub String);

impl VendorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for VendorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A vendor record is created on first successful claim and only ever grows
/// its assigned-order set.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vendor {
    pub vendor_id: VendorId,
    pub assigned_orders: BTreeSet<String>,
    pub created_at: DateTime<Utc>,
}

impl Vendor {
    pub fn new(vendor_id: VendorId, created_at: DateTime<Utc>) -> Self {
        Self { vendor_id, assigned_orders: BTreeSet::new(), created_at }
    }

    /// Add-once semantics; returns false when the order was already linked.
    pub fn link_order(&mut self, order_id: &str) -> bool {
        self.assigned_orders.insert(order_id.to_owned())
    }
}
