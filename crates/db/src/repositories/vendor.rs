use chrono::{DateTime, Utc};
use sqlx::Row;

use dhobi_core::domain::order::OrderId;
use dhobi_core::domain::vendor::VendorId;

use super::{RepositoryError, VendorRepository};
use crate::DbPool;

#[derive(Clone)]
pub struct SqlVendorRepository {
    pool: DbPool,
}

impl SqlVendorRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl VendorRepository for SqlVendorRepository {
    async fn upsert(
        &self,
        vendor: &VendorId,
        created_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "INSERT INTO vendors (vendor_id, created_at) VALUES (?1, ?2) \
             ON CONFLICT (vendor_id) DO NOTHING",
        )
        .bind(vendor.as_str())
        .bind(created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn link_order(
        &self,
        vendor: &VendorId,
        order: &OrderId,
    ) -> Result<(), RepositoryError> {
        // Primary key on (vendor_id, order_id) gives add-to-set semantics.
        sqlx::query("INSERT OR IGNORE INTO vendor_orders (vendor_id, order_id) VALUES (?1, ?2)")
            .bind(vendor.as_str())
            .bind(order.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn assigned_orders(&self, vendor: &VendorId) -> Result<Vec<OrderId>, RepositoryError> {
        let rows = sqlx::query(
            "SELECT order_id FROM vendor_orders WHERE vendor_id = ?1 ORDER BY order_id",
        )
        .bind(vendor.as_str())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(|row| OrderId(row.get::<String, _>("order_id"))).collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use dhobi_core::domain::order::OrderId;
    use dhobi_core::domain::vendor::VendorId;

    use crate::migrations::run_pending;
    use crate::repositories::VendorRepository;
    use crate::connect_with_settings;

    use super::SqlVendorRepository;

    #[tokio::test]
    async fn upsert_and_link_are_idempotent() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        let repo = SqlVendorRepository::new(pool);
        let vendor = VendorId("919043331484".to_string());
        let order = OrderId("ORD-1730000000001".to_string());

        repo.upsert(&vendor, Utc::now()).await.expect("first upsert");
        repo.upsert(&vendor, Utc::now()).await.expect("second upsert");
        repo.link_order(&vendor, &order).await.expect("first link");
        repo.link_order(&vendor, &order).await.expect("second link");

        let assigned = repo.assigned_orders(&vendor).await.expect("list");
        assert_eq!(assigned, vec![order]);
    }

    #[tokio::test]
    async fn unknown_vendor_has_no_assigned_orders() {
        let pool = connect_with_settings("sqlite::memory:", 1, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        let repo = SqlVendorRepository::new(pool);

        let assigned = repo
            .assigned_orders(&VendorId("919700000000".to_string()))
            .await
            .expect("list");
        assert!(assigned.is_empty());
    }
}
