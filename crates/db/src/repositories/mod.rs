use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use dhobi_core::domain::order::{Order, OrderId};
use dhobi_core::domain::vendor::VendorId;

pub mod memory;
pub mod order;
pub mod vendor;

pub use memory::{InMemoryOrderRepository, InMemoryVendorRepository};
pub use order::SqlOrderRepository;
pub use vendor::SqlVendorRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Result of the one-shot PENDING -> ASSIGNED compare-and-set.
#[derive(Clone, Debug, PartialEq)]
pub enum ClaimOutcome {
    /// This caller won; the returned order carries the new vendor id.
    Accepted { order: Order },
    /// The order exists but some claim already succeeded.
    AlreadyAssigned,
    NotFound,
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError>;

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Resolves an operator short code: the most-recently-created PENDING
    /// order whose id ends with `suffix`. Ties on creation time break on the
    /// larger id, so resolution is always deterministic.
    async fn find_pending_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<OrderId>, RepositoryError>;

    /// Atomically transitions `(id, PENDING)` to ASSIGNED with the given
    /// vendor. This must be a single conditional update, never a
    /// read-then-write pair: concurrent callers race on exactly this point.
    async fn claim(
        &self,
        id: &OrderId,
        vendor: &VendorId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, RepositoryError>;
}

#[async_trait]
pub trait VendorRepository: Send + Sync {
    /// Creates the vendor record on first sight; later calls are no-ops.
    async fn upsert(&self, vendor: &VendorId, created_at: DateTime<Utc>)
        -> Result<(), RepositoryError>;

    /// Add-to-set semantics: linking the same order twice leaves one row.
    async fn link_order(&self, vendor: &VendorId, order: &OrderId)
        -> Result<(), RepositoryError>;

    async fn assigned_orders(&self, vendor: &VendorId) -> Result<Vec<OrderId>, RepositoryError>;
}
