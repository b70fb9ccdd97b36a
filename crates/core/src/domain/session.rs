use chrono::{DateTime, Duration, Utc};

use crate::domain::order::{CustomerInfo, LineItem};

/// The six ordering-dialog steps, in the only order they may be visited.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogStep {
    Catalog,
    Ordering,
    GetName,
    GetAddress,
    GetPayment,
    Confirm,
}

/// Per-user conversational progress. One session exists per active user id;
/// it is created lazily on first contact and reset when an order is placed
/// or the session sits idle past the configured threshold.
#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    pub user_id: String,
    pub step: DialogStep,
    pub cart: Vec<LineItem>,
    pub customer: CustomerInfo,
    pub last_activity: DateTime<Utc>,
}

impl Session {
    pub fn new(user_id: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.into(),
            step: DialogStep::Catalog,
            cart: Vec::new(),
            customer: CustomerInfo::default(),
            last_activity: now,
        }
    }

    /// Back to a blank conversation, keeping the user id.
    pub fn reset(&mut self, now: DateTime<Utc>) {
        self.step = DialogStep::Catalog;
        self.cart.clear();
        self.customer = CustomerInfo::default();
        self.last_activity = now;
    }

    pub fn is_idle(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now - self.last_activity > threshold
    }
}
