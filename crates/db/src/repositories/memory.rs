use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::Mutex;

use dhobi_core::domain::order::{Order, OrderId, OrderStatus};
use dhobi_core::domain::vendor::{Vendor, VendorId};

use super::{ClaimOutcome, OrderRepository, RepositoryError, VendorRepository};

/// In-memory order store for orchestration tests. The claim runs under the
/// single map lock, which gives it the same atomicity the SQL version gets
/// from its conditional update.
#[derive(Default)]
pub struct InMemoryOrderRepository {
    orders: Mutex<HashMap<String, Order>>,
}

#[async_trait::async_trait]
impl OrderRepository for InMemoryOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut orders = self.orders.lock().await;
        orders.insert(order.order_id.0.clone(), order.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let orders = self.orders.lock().await;
        Ok(orders.get(&id.0).cloned())
    }

    async fn find_pending_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let orders = self.orders.lock().await;
        Ok(orders
            .values()
            .filter(|order| {
                order.status == OrderStatus::Pending && order.order_id.0.ends_with(suffix)
            })
            .max_by_key(|order| (order.created_at, order.order_id.clone()))
            .map(|order| order.order_id.clone()))
    }

    async fn claim(
        &self,
        id: &OrderId,
        vendor: &VendorId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, RepositoryError> {
        let mut orders = self.orders.lock().await;
        let Some(order) = orders.get_mut(&id.0) else {
            return Ok(ClaimOutcome::NotFound);
        };

        if order.assign(vendor.as_str(), assigned_at).is_err() {
            return Ok(ClaimOutcome::AlreadyAssigned);
        }

        Ok(ClaimOutcome::Accepted { order: order.clone() })
    }
}

#[derive(Default)]
pub struct InMemoryVendorRepository {
    vendors: Mutex<HashMap<String, Vendor>>,
}

#[async_trait::async_trait]
impl VendorRepository for InMemoryVendorRepository {
    async fn upsert(
        &self,
        vendor: &VendorId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let mut vendors = self.vendors.lock().await;
        vendors
            .entry(vendor.0.clone())
            .or_insert_with(|| Vendor::new(vendor.clone(), created_at));
        Ok(())
    }

    async fn link_order(
        &self,
        vendor: &VendorId,
        order: &OrderId,
    ) -> Result<(), RepositoryError> {
        let mut vendors = self.vendors.lock().await;
        if let Some(record) = vendors.get_mut(&vendor.0) {
            record.link_order(order.as_str());
        }
        Ok(())
    }

    async fn assigned_orders(&self, vendor: &VendorId) -> Result<Vec<OrderId>, RepositoryError> {
        let vendors = self.vendors.lock().await;
        Ok(vendors
            .get(&vendor.0)
            .map(|record| {
                record.assigned_orders.iter().cloned().map(OrderId).collect::<Vec<_>>()
            })
            .unwrap_or_default())
    }
}
