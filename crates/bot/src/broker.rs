use std::sync::Arc;

use chrono::Utc;

use dhobi_core::domain::order::{Order, OrderId};
use dhobi_core::domain::vendor::VendorId;
use dhobi_core::errors::ApplicationError;
use dhobi_db::{ClaimOutcome, OrderRepository, RepositoryError, VendorRepository};
use dhobi_whatsapp::{texts, MessageSender};

/// How a vendor referenced the order in an accept command: the full id, or
/// a digits-only short code matched against the id's tail.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClaimCode {
    Exact(OrderId),
    Suffix(String),
}

impl ClaimCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Exact(id) => id.as_str(),
            Self::Suffix(digits) => digits,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignmentResult {
    Accepted { order_id: OrderId },
    AlreadyAssigned,
    NotFound,
}

/// First-to-claim vendor assignment. `publish` fans a new order out to the
/// whole vendor pool; `claim` settles the race through the repository's
/// compare-and-set, so exactly one vendor ever wins an order.
pub struct AssignmentBroker {
    orders: Arc<dyn OrderRepository>,
    vendors: Arc<dyn VendorRepository>,
    sender: Arc<dyn MessageSender>,
    vendor_pool: Vec<String>,
}

impl AssignmentBroker {
    pub fn new(
        orders: Arc<dyn OrderRepository>,
        vendors: Arc<dyn VendorRepository>,
        sender: Arc<dyn MessageSender>,
        vendor_pool: Vec<String>,
    ) -> Self {
        Self { orders, vendors, sender, vendor_pool }
    }

    /// Broadcasts the accept prompt to every vendor in the pool. Delivery is
    /// best-effort per vendor; the order is already durable by the time this
    /// runs, so a failed send only costs that vendor the notification.
    pub async fn publish(&self, order: &Order) {
        let broadcast = texts::vendor_broadcast(order);
        for vendor in &self.vendor_pool {
            if let Err(error) = self.sender.send_text(vendor, &broadcast).await {
                tracing::warn!(
                    event_name = "broker.broadcast_failed",
                    vendor_id = %vendor,
                    order_id = %order.order_id,
                    error = %error,
                    "vendor broadcast dropped"
                );
            }
        }

        tracing::info!(
            event_name = "broker.order_published",
            order_id = %order.order_id,
            vendor_count = self.vendor_pool.len(),
            "order offered to vendor pool"
        );
    }

    /// Attempts to take the order for `vendor_id`. Of N racing claims for
    /// the same order, exactly one returns `Accepted`; the rest observe
    /// `AlreadyAssigned`. Losing outcomes notify only the claiming vendor
    /// and change no state.
    pub async fn claim(
        &self,
        vendor_id: &VendorId,
        code: &ClaimCode,
    ) -> Result<AssignmentResult, ApplicationError> {
        let now = Utc::now();

        let resolved = match code {
            ClaimCode::Exact(order_id) => Some(order_id.clone()),
            ClaimCode::Suffix(digits) => self
                .orders
                .find_pending_by_suffix(digits)
                .await
                .map_err(persistence)?,
        };

        let Some(order_id) = resolved else {
            self.deliver(vendor_id.as_str(), &texts::claim_not_found(code.as_str())).await;
            return Ok(AssignmentResult::NotFound);
        };

        match self.orders.claim(&order_id, vendor_id, now).await.map_err(persistence)? {
            ClaimOutcome::Accepted { order } => {
                self.vendors.upsert(vendor_id, now).await.map_err(persistence)?;
                self.vendors.link_order(vendor_id, &order.order_id).await.map_err(persistence)?;

                self.deliver(
                    vendor_id.as_str(),
                    &texts::claim_accepted(order.order_id.as_str()),
                )
                .await;
                self.deliver(
                    &order.customer_id,
                    &texts::customer_assigned(order.order_id.as_str(), vendor_id.as_str()),
                )
                .await;

                tracing::info!(
                    event_name = "broker.claim_accepted",
                    order_id = %order.order_id,
                    vendor_id = %vendor_id,
                    "order assigned to vendor"
                );
                Ok(AssignmentResult::Accepted { order_id: order.order_id })
            }
            ClaimOutcome::AlreadyAssigned => {
                self.deliver(vendor_id.as_str(), &texts::claim_already_assigned()).await;
                Ok(AssignmentResult::AlreadyAssigned)
            }
            ClaimOutcome::NotFound => {
                self.deliver(vendor_id.as_str(), &texts::claim_not_found(code.as_str())).await;
                Ok(AssignmentResult::NotFound)
            }
        }
    }

    async fn deliver(&self, to: &str, body: &str) {
        if let Err(error) = self.sender.send_text(to, body).await {
            tracing::warn!(
                event_name = "broker.delivery_failed",
                user_id = %to,
                error = %error,
                "outbound message dropped"
            );
        }
    }
}

fn persistence(error: RepositoryError) -> ApplicationError {
    ApplicationError::Persistence(error.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, Utc};
    use rust_decimal::Decimal;

    use dhobi_core::domain::order::{
        CustomerInfo, LineItem, Order, OrderId, OrderStatus,
    };
    use dhobi_core::domain::vendor::VendorId;
    use dhobi_db::{
        InMemoryOrderRepository, InMemoryVendorRepository, OrderRepository, VendorRepository,
    };
    use dhobi_whatsapp::RecordingSender;

    use super::{AssignmentBroker, AssignmentResult, ClaimCode};

    const CUSTOMER: &str = "919916814517";
    const VENDOR_A: &str = "919043331484";
    const VENDOR_B: &str = "919710486191";

    fn order(id: &str, created_offset_secs: i64) -> Order {
        Order {
            order_id: OrderId(id.to_string()),
            customer_id: CUSTOMER.to_string(),
            line_items: vec![LineItem {
                name: "Shirt".to_string(),
                quantity: 2,
                unit_price: Decimal::from(15),
            }],
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

    struct Fixture {
        orders: Arc<InMemoryOrderRepository>,
        vendors: Arc<InMemoryVendorRepository>,
        sender: Arc<RecordingSender>,
        broker: AssignmentBroker,
    }

    fn fixture() -> Fixture {
        let orders = Arc::new(InMemoryOrderRepository::default());
        let vendors = Arc::new(InMemoryVendorRepository::default());
        let sender = Arc::new(RecordingSender::new());
        let broker = AssignmentBroker::new(
            Arc::clone(&orders) as Arc<dyn OrderRepository>,
            Arc::clone(&vendors) as Arc<dyn VendorRepository>,
            Arc::clone(&sender) as _,
            vec![VENDOR_A.to_string(), VENDOR_B.to_string()],
        );
        Fixture { orders, vendors, sender, broker }
    }

    #[tokio::test]
    async fn publish_notifies_every_vendor_in_the_pool() {
        let fixture = fixture();
        let order = order("ORD-1730000000123", 0);

        fixture.broker.publish(&order).await;

        for vendor in [VENDOR_A, VENDOR_B] {
            let sent = fixture.sender.sent_to(vendor).await;
            assert_eq!(sent.len(), 1, "vendor {vendor} should get one broadcast");
            assert!(sent[0].contains("ACCEPT ORD-1730000000123"));
        }
    }

    #[tokio::test]
    async fn accepted_claim_links_vendor_and_notifies_both_parties() {
        let fixture = fixture();
        fixture.orders.insert(&order("ORD-1730000000123", 0)).await.expect("insert");
        let vendor = VendorId(VENDOR_A.to_string());

        let result = fixture
            .broker
            .claim(&vendor, &ClaimCode::Exact(OrderId("ORD-1730000000123".to_string())))
            .await
            .expect("claim");

        assert_eq!(
            result,
            AssignmentResult::Accepted { order_id: OrderId("ORD-1730000000123".to_string()) }
        );

        let linked = fixture.vendors.assigned_orders(&vendor).await.expect("links");
        assert_eq!(linked, vec![OrderId("ORD-1730000000123".to_string())]);

        let vendor_messages = fixture.sender.sent_to(VENDOR_A).await;
        assert!(vendor_messages.last().expect("message").contains("You accepted order"));
        let customer_messages = fixture.sender.sent_to(CUSTOMER).await;
        assert!(customer_messages.last().expect("message").contains("now being handled by"));
    }

    #[tokio::test]
    async fn losing_claim_notifies_only_the_vendor() {
        let fixture = fixture();
        fixture.orders.insert(&order("ORD-1730000000123", 0)).await.expect("insert");

        fixture
            .broker
            .claim(
                &VendorId(VENDOR_A.to_string()),
                &ClaimCode::Exact(OrderId("ORD-1730000000123".to_string())),
            )
            .await
            .expect("winning claim");
        let customer_messages_before = fixture.sender.sent_to(CUSTOMER).await.len();

        let result = fixture
            .broker
            .claim(
                &VendorId(VENDOR_B.to_string()),
                &ClaimCode::Exact(OrderId("ORD-1730000000123".to_string())),
            )
            .await
            .expect("losing claim");

        assert_eq!(result, AssignmentResult::AlreadyAssigned);
        assert_eq!(fixture.sender.sent_to(CUSTOMER).await.len(), customer_messages_before);
        let loser_messages = fixture.sender.sent_to(VENDOR_B).await;
        assert!(loser_messages.last().expect("message").contains("already assigned"));

        let losing_links =
            fixture.vendors.assigned_orders(&VendorId(VENDOR_B.to_string())).await.expect("links");
        assert!(losing_links.is_empty());
    }

    #[tokio::test]
    async fn unknown_code_reports_not_found_without_state_changes() {
        let fixture = fixture();

        let result = fixture
            .broker
            .claim(&VendorId(VENDOR_A.to_string()), &ClaimCode::Suffix("999".to_string()))
            .await
            .expect("claim");

        assert_eq!(result, AssignmentResult::NotFound);
        let messages = fixture.sender.sent_to(VENDOR_A).await;
        assert!(messages.last().expect("message").contains("No order found matching \"999\""));
    }

    #[tokio::test]
    async fn suffix_claim_resolves_to_the_most_recent_pending_match() {
        let fixture = fixture();
        fixture.orders.insert(&order("ORD-1730000000123", 0)).await.expect("older");
        fixture.orders.insert(&order("ORD-1730000001123", 60)).await.expect("newer");

        let result = fixture
            .broker
            .claim(&VendorId(VENDOR_A.to_string()), &ClaimCode::Suffix("123".to_string()))
            .await
            .expect("claim");

        assert_eq!(
            result,
            AssignmentResult::Accepted { order_id: OrderId("ORD-1730000001123".to_string()) }
        );
    }

    #[tokio::test]
    async fn racing_vendors_settle_on_exactly_one_winner() {
        let fixture = fixture();
        fixture.orders.insert(&order("ORD-1730000000777", 0)).await.expect("insert");
        let broker = Arc::new(fixture.broker);

        let mut handles = Vec::new();
        for vendor in 0..8 {
            let broker = Arc::clone(&broker);
            handles.push(tokio::spawn(async move {
                broker
                    .claim(
                        &VendorId(format!("9190433314{vendor:02}")),
                        &ClaimCode::Exact(OrderId("ORD-1730000000777".to_string())),
                    )
                    .await
                    .expect("claim")
            }));
        }

        let mut accepted = 0;
        let mut already_assigned = 0;
        for handle in handles {
            match handle.await.expect("join") {
                AssignmentResult::Accepted { .. } => accepted += 1,
                AssignmentResult::AlreadyAssigned => already_assigned += 1,
                AssignmentResult::NotFound => panic!("order must be found by every claimer"),
            }
        }

        assert_eq!(accepted, 1);
        assert_eq!(already_assigned, 7);

        let stored = fixture
            .orders
            .find_by_id(&OrderId("ORD-1730000000777".to_string()))
            .await
            .expect("find")
            .expect("present");
        assert_eq!(stored.status, OrderStatus::Assigned);
    }

    #[tokio::test]
    async fn duplicate_accept_from_the_winner_is_reported_as_already_assigned() {
        let fixture = fixture();
        fixture.orders.insert(&order("ORD-1730000000123", 0)).await.expect("insert");
        let vendor = VendorId(VENDOR_A.to_string());
        let code = ClaimCode::Exact(OrderId("ORD-1730000000123".to_string()));

        let first = fixture.broker.claim(&vendor, &code).await.expect("first");
        let second = fixture.broker.claim(&vendor, &code).await.expect("replayed");

        assert!(matches!(first, AssignmentResult::Accepted { .. }));
        assert_eq!(second, AssignmentResult::AlreadyAssigned);

        let linked = fixture.vendors.assigned_orders(&vendor).await.expect("links");
        assert_eq!(linked.len(), 1);
    }
}
