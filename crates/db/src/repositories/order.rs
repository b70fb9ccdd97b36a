use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::Row;

use dhobi_core::domain::order::{CustomerInfo, LineItem, Order, OrderId, OrderStatus};
use dhobi_core::domain::vendor::VendorId;

use super::{ClaimOutcome, OrderRepository, RepositoryError};
use crate::DbPool;

#[derive(Clone)]
pub struct SqlOrderRepository {
    pool: DbPool,
}

impl SqlOrderRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl OrderRepository for SqlOrderRepository {
    async fn insert(&self, order: &Order) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO orders (order_id, customer_id, customer_name, customer_address, \
             payment_method, status, vendor_id, created_at, assigned_at) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(order.order_id.as_str())
        .bind(&order.customer_id)
        .bind(&order.customer.name)
        .bind(&order.customer.address)
        .bind(&order.customer.payment_method)
        .bind(order.status.as_str())
        .bind(order.vendor_id.as_deref())
        .bind(order.created_at)
        .bind(order.assigned_at)
        .execute(&mut *tx)
        .await?;

        for item in &order.line_items {
            sqlx::query(
                "INSERT INTO order_lines (order_id, item_name, quantity, unit_price) \
                 VALUES (?1, ?2, ?3, ?4)",
            )
            .bind(order.order_id.as_str())
            .bind(&item.name)
            .bind(i64::from(item.quantity))
            .bind(item.unit_price.to_string())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &OrderId) -> Result<Option<Order>, RepositoryError> {
        let Some(row) = sqlx::query(
            "SELECT order_id, customer_id, customer_name, customer_address, payment_method, \
             status, vendor_id, created_at, assigned_at \
             FROM orders WHERE order_id = ?1",
        )
        .bind(id.as_str())
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let line_rows = sqlx::query(
            "SELECT item_name, quantity, unit_price FROM order_lines \
             WHERE order_id = ?1 ORDER BY id",
        )
        .bind(id.as_str())
        .fetch_all(&self.pool)
        .await?;

        let mut line_items = Vec::with_capacity(line_rows.len());
        for line in line_rows {
            line_items.push(LineItem {
                name: line.get::<String, _>("item_name"),
                quantity: decode_quantity(line.get::<i64, _>("quantity"))?,
                unit_price: decode_price(&line.get::<String, _>("unit_price"))?,
            });
        }

        let status = row
            .get::<String, _>("status")
            .parse::<OrderStatus>()
            .map_err(|error| RepositoryError::Decode(error.to_string()))?;

        Ok(Some(Order {
            order_id: OrderId(row.get::<String, _>("order_id")),
            customer_id: row.get::<String, _>("customer_id"),
            line_items,
            customer: CustomerInfo {
                name: row.get::<String, _>("customer_name"),
                address: row.get::<String, _>("customer_address"),
                payment_method: row.get::<String, _>("payment_method"),
            },
            status,
            vendor_id: row.get::<Option<String>, _>("vendor_id"),
            created_at: row.get::<DateTime<Utc>, _>("created_at"),
            assigned_at: row.get::<Option<DateTime<Utc>>, _>("assigned_at"),
        }))
    }

    async fn find_pending_by_suffix(
        &self,
        suffix: &str,
    ) -> Result<Option<OrderId>, RepositoryError> {
        let row = sqlx::query(
            "SELECT order_id FROM orders \
             WHERE status = 'pending' AND order_id LIKE '%' || ?1 \
             ORDER BY created_at DESC, order_id DESC LIMIT 1",
        )
        .bind(suffix)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| OrderId(row.get::<String, _>("order_id"))))
    }

    async fn claim(
        &self,
        id: &OrderId,
        vendor: &VendorId,
        assigned_at: DateTime<Utc>,
    ) -> Result<ClaimOutcome, RepositoryError> {
        // The status predicate makes this a compare-and-set: of any number
        // of racing claims, exactly one update matches a pending row.
        let result = sqlx::query(
            "UPDATE orders SET status = 'assigned', vendor_id = ?1, assigned_at = ?2 \
             WHERE order_id = ?3 AND status = 'pending'",
        )
        .bind(vendor.as_str())
        .bind(assigned_at)
        .bind(id.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 1 {
            let order = self.find_by_id(id).await?.ok_or_else(|| {
                RepositoryError::Decode(format!("claimed order `{id}` vanished"))
            })?;
            return Ok(ClaimOutcome::Accepted { order });
        }

        match self.find_by_id(id).await? {
            Some(_) => Ok(ClaimOutcome::AlreadyAssigned),
            None => Ok(ClaimOutcome::NotFound),
        }
    }
}

fn decode_quantity(raw: i64) -> Result<u32, RepositoryError> {
    u32::try_from(raw)
        .map_err(|_| RepositoryError::Decode(format!("line quantity `{raw}` out of range")))
}

fn decode_price(raw: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(raw)
        .map_err(|error| RepositoryError::Decode(format!("bad unit price `{raw}`: {error}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use dhobi_core::domain::order::{CustomerInfo, LineItem, Order, OrderId, OrderStatus};
    use dhobi_core::domain::vendor::VendorId;

    use crate::migrations::run_pending;
    use crate::repositories::{ClaimOutcome, OrderRepository};
    use crate::{connect_with_settings, DbPool};

    use super::SqlOrderRepository;

    async fn migrated_pool(url: &str, max_connections: u32) -> DbPool {
        let pool = connect_with_settings(url, max_connections, 30).await.expect("connect");
        run_pending(&pool).await.expect("migrate");
        pool
    }

    fn order(id: &str, created_offset_secs: i64) -> Order {
        Order {
            order_id: OrderId(id.to_string()),
            customer_id: "919916814517".to_string(),
            line_items: vec![
                LineItem {
                    name: "Shirt".to_string(),
                    quantity: 2,
                    unit_price: Decimal::from(15),
                },
                LineItem {
                    name: "Saree".to_string(),
                    quantity: 1,
                    unit_price: Decimal::from(100),
                },
            ],
            customer: CustomerInfo {
                name: "Jane Doe".to_string(),
                address: "12 Elm St".to_string(),
                payment_method: "Cash".to_string(),
            },
            status: OrderStatus::Pending,
            vendor_id: None,
            created_at: Utc::now() + Duration::seconds(created_offset_secs),
            assigned_at: None,
        }
    }

    #[tokio::test]
    async fn insert_and_find_round_trip_preserves_lines() {
        let pool = migrated_pool("sqlite::memory:", 1).await;
        let repo = SqlOrderRepository::new(pool);
        let original = order("ORD-1730000000001", 0);

        repo.insert(&original).await.expect("insert");
        let found = repo.find_by_id(&original.order_id).await.expect("find").expect("present");

        assert_eq!(found, original);
        assert_eq!(found.total(), Decimal::from(130));
    }

    #[tokio::test]
    async fn claim_is_one_shot_per_order() {
        let pool = migrated_pool("sqlite::memory:", 1).await;
        let repo = SqlOrderRepository::new(pool);
        repo.insert(&order("ORD-1730000000002", 0)).await.expect("insert");
        let id = OrderId("ORD-1730000000002".to_string());

        let first = repo
            .claim(&id, &VendorId("919043331484".to_string()), Utc::now())
            .await
            .expect("first claim");
        match first {
            ClaimOutcome::Accepted { order } => {
                assert_eq!(order.status, OrderStatus::Assigned);
                assert_eq!(order.vendor_id.as_deref(), Some("919043331484"));
                assert!(order.assigned_at.is_some());
            }
            other => panic!("expected accepted, got {other:?}"),
        }

        let second = repo
            .claim(&id, &VendorId("919710486191".to_string()), Utc::now())
            .await
            .expect("second claim");
        assert_eq!(second, ClaimOutcome::AlreadyAssigned);

        let stored = repo.find_by_id(&id).await.expect("find").expect("present");
        assert_eq!(stored.vendor_id.as_deref(), Some("919043331484"));
    }

    #[tokio::test]
    async fn claim_of_unknown_order_reports_not_found() {
        let pool = migrated_pool("sqlite::memory:", 1).await;
        let repo = SqlOrderRepository::new(pool);

        let outcome = repo
            .claim(
                &OrderId("ORD-404".to_string()),
                &VendorId("919043331484".to_string()),
                Utc::now(),
            )
            .await
            .expect("claim");

        assert_eq!(outcome, ClaimOutcome::NotFound);
    }

    #[tokio::test]
    async fn suffix_lookup_prefers_the_most_recent_pending_order() {
        let pool = migrated_pool("sqlite::memory:", 1).await;
        let repo = SqlOrderRepository::new(pool);

        repo.insert(&order("ORD-1730000000123", 0)).await.expect("insert older");
        repo.insert(&order("ORD-1730000001123", 60)).await.expect("insert newer");

        let resolved = repo.find_pending_by_suffix("123").await.expect("lookup");
        assert_eq!(resolved, Some(OrderId("ORD-1730000001123".to_string())));
    }

    #[tokio::test]
    async fn suffix_lookup_skips_assigned_orders() {
        let pool = migrated_pool("sqlite::memory:", 1).await;
        let repo = SqlOrderRepository::new(pool);

        repo.insert(&order("ORD-1730000000123", 0)).await.expect("insert older");
        repo.insert(&order("ORD-1730000001123", 60)).await.expect("insert newer");
        repo.claim(
            &OrderId("ORD-1730000001123".to_string()),
            &VendorId("919043331484".to_string()),
            Utc::now(),
        )
        .await
        .expect("claim newer");

        let resolved = repo.find_pending_by_suffix("123").await.expect("lookup");
        assert_eq!(resolved, Some(OrderId("ORD-1730000000123".to_string())));
    }

    #[tokio::test]
    async fn concurrent_claims_accept_exactly_one_vendor() {
        let pool =
            migrated_pool("sqlite:file:claim_race_orders?mode=memory&cache=shared", 5).await;
        let repo = Arc::new(SqlOrderRepository::new(pool));
        repo.insert(&order("ORD-1730000000777", 0)).await.expect("insert");

        let mut handles = Vec::new();
        for vendor in 0..8 {
            let repo = Arc::clone(&repo);
            handles.push(tokio::spawn(async move {
                repo.claim(
                    &OrderId("ORD-1730000000777".to_string()),
                    &VendorId(format!("9190433314{vendor:02}")),
                    Utc::now(),
                )
                .await
                .expect("claim")
            }));
        }

        let mut accepted = 0;
        let mut already_assigned = 0;
        for handle in handles {
            match handle.await.expect("join") {
                ClaimOutcome::Accepted { .. } => accepted += 1,
                ClaimOutcome::AlreadyAssigned => already_assigned += 1,
                ClaimOutcome::NotFound => panic!("order must be visible to every claimer"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(already_assigned, 7);

        let stored = repo
            .find_by_id(&OrderId("ORD-1730000000777".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.status, OrderStatus::Assigned);
        assert!(stored.vendor_id.is_some());
    }
}
