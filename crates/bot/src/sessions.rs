use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex};

use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;

use dhobi_core::config::SessionConfig;
use dhobi_core::dialog::{DialogEffect, DialogEngine};
use dhobi_core::domain::order::{Order, OrderIdGenerator, OrderStatus};
use dhobi_core::domain::session::Session;
use dhobi_core::errors::ApplicationError;
use dhobi_db::OrderRepository;
use dhobi_whatsapp::{texts, MessageSender};

const SWEEP_INTERVAL_SECS: i64 = 60;

struct SessionSlot {
    cell: Arc<Mutex<Session>>,
    last_activity: DateTime<Utc>,
}

struct SessionMap {
    slots: HashMap<String, SessionSlot>,
    recently_placed: HashMap<String, DateTime<Utc>>,
    last_sweep: DateTime<Utc>,
}

/// Owns every live ordering conversation. Turns for the same user are
/// serialized on a per-user lock; turns for different users run in
/// parallel. The map itself is only held long enough to fetch or create a
/// slot, never across an await.
pub struct SessionService {
    engine: DialogEngine,
    orders: Arc<dyn OrderRepository>,
    sender: Arc<dyn MessageSender>,
    order_ids: OrderIdGenerator,
    idle_timeout: Duration,
    replay_guard: Duration,
    state: StdMutex<SessionMap>,
}

impl SessionService {
    pub fn new(
        engine: DialogEngine,
        orders: Arc<dyn OrderRepository>,
        sender: Arc<dyn MessageSender>,
        settings: &SessionConfig,
    ) -> Self {
        Self {
            engine,
            orders,
            sender,
            order_ids: OrderIdGenerator::new(),
            idle_timeout: Duration::seconds(settings.idle_timeout_secs as i64),
            replay_guard: Duration::seconds(settings.replay_guard_secs as i64),
            state: StdMutex::new(SessionMap {
                slots: HashMap::new(),
                recently_placed: HashMap::new(),
                last_sweep: Utc::now(),
            }),
        }
    }

    /// Advances the user's dialog by one message, delivering every prompt
    /// the step produces. Returns the freshly persisted order when this
    /// message completed the CONFIRM step.
    ///
    /// A persistence failure aborts the turn before any success message is
    /// sent, so the webhook can fail and the provider will redeliver.
    pub async fn handle_message(
        &self,
        user_id: &str,
        text: &str,
    ) -> Result<Option<Order>, ApplicationError> {
        self.handle_message_at(user_id, text, Utc::now()).await
    }

    async fn handle_message_at(
        &self,
        user_id: &str,
        text: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<Order>, ApplicationError> {
        if self.is_replayed_confirmation(user_id, text, now) {
            self.deliver(user_id, &texts::order_already_placed()).await;
            return Ok(None);
        }

        let cell = self.session_cell(user_id, now);
        let mut session = cell.lock().await;

        // Re-check under the session lock: a racing redelivery may have
        // finalized this conversation while we waited.
        if self.is_replayed_confirmation(user_id, text, now) {
            self.deliver(user_id, &texts::order_already_placed()).await;
            return Ok(None);
        }

        let turn = self.engine.advance(&mut session, text, now);
        for reply in &turn.replies {
            self.deliver(user_id, &texts::render_reply(reply)).await;
        }

        if turn.effect != Some(DialogEffect::PlaceOrder) {
            return Ok(None);
        }

        let order = Order {
            order_id: self.order_ids.next(now),
            customer_id: user_id.to_owned(),
            line_items: session.cart.clone(),
            customer: session.customer.clone(),
            status: OrderStatus::Pending,
            vendor_id: None,
            created_at: now,
            assigned_at: None,
        };

        self.orders
            .insert(&order)
            .await
            .map_err(|error| ApplicationError::Persistence(error.to_string()))?;

        session.reset(now);
        self.mark_placed(user_id, now);
        self.deliver(user_id, &texts::order_placed(order.order_id.as_str())).await;

        tracing::info!(
            event_name = "session.order_placed",
            user_id = %user_id,
            order_id = %order.order_id,
            total = %order.total(),
            "order persisted as pending"
        );

        Ok(Some(order))
    }

    pub fn active_sessions(&self) -> usize {
        self.state.lock().expect("session map lock poisoned").slots.len()
    }

    fn session_cell(&self, user_id: &str, now: DateTime<Utc>) -> Arc<Mutex<Session>> {
        let mut state = self.state.lock().expect("session map lock poisoned");

        if now - state.last_sweep >= Duration::seconds(SWEEP_INTERVAL_SECS) {
            let idle_timeout = self.idle_timeout;
            let replay_guard = self.replay_guard;
            state.slots.retain(|_, slot| now - slot.last_activity <= idle_timeout);
            state.recently_placed.retain(|_, placed_at| now - *placed_at <= replay_guard);
            state.last_sweep = now;
        }

        let slot = state.slots.entry(user_id.to_owned()).or_insert_with(|| SessionSlot {
            cell: Arc::new(Mutex::new(Session::new(user_id, now))),
            last_activity: now,
        });
        slot.last_activity = now;
        Arc::clone(&slot.cell)
    }

    fn is_replayed_confirmation(&self, user_id: &str, text: &str, now: DateTime<Utc>) -> bool {
        if !text.trim().eq_ignore_ascii_case("place order") {
            return false;
        }

        let state = self.state.lock().expect("session map lock poisoned");
        state
            .recently_placed
            .get(user_id)
            .is_some_and(|placed_at| now - *placed_at <= self.replay_guard)
    }

    fn mark_placed(&self, user_id: &str, now: DateTime<Utc>) {
        let mut state = self.state.lock().expect("session map lock poisoned");
        state.recently_placed.insert(user_id.to_owned(), now);
    }

    async fn deliver(&self, to: &str, body: &str) {
        if let Err(error) = self.sender.send_text(to, body).await {
            tracing::warn!(
                event_name = "session.delivery_failed",
                user_id = %to,
                error = %error,
                "outbound message dropped"
            );
        }
    }
}
