use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;

use dhobi_core::config::PartiesConfig;
use dhobi_core::domain::order::OrderId;
use dhobi_core::domain::vendor::VendorId;
use dhobi_core::errors::ApplicationError;
use dhobi_whatsapp::{texts, MessageSender};

use crate::broker::{AssignmentBroker, AssignmentResult, ClaimCode};
use crate::sessions::SessionService;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Blank sender or text; acknowledged without touching any state.
    NoMessage,
    /// Sender is on neither allowlist; rejected with a fixed message.
    AccessDenied,
    Claim(AssignmentResult),
    Dialog { order_placed: Option<OrderId> },
}

/// Entry point for every decoded inbound message: role check, then route to
/// the claim path (vendors sending an accept command) or the ordering
/// dialog (everyone else, vendors included).
pub struct Dispatcher {
    sessions: Arc<SessionService>,
    broker: Arc<AssignmentBroker>,
    sender: Arc<dyn MessageSender>,
    verified_customers: HashSet<String>,
    vendors: HashSet<String>,
}

impl Dispatcher {
    pub fn new(
        sessions: Arc<SessionService>,
        broker: Arc<AssignmentBroker>,
        sender: Arc<dyn MessageSender>,
        parties: &PartiesConfig,
    ) -> Self {
        Self {
            sessions,
            broker,
            sender,
            verified_customers: parties.verified_customers.iter().cloned().collect(),
            vendors: parties.vendors.iter().cloned().collect(),
        }
    }

    pub async fn dispatch(
        &self,
        sender_id: &str,
        text: &str,
    ) -> Result<DispatchOutcome, ApplicationError> {
        let sender_id = sender_id.trim();
        let text = text.trim();
        if sender_id.is_empty() || text.is_empty() {
            return Ok(DispatchOutcome::NoMessage);
        }

        let correlation_id = Uuid::new_v4();
        let is_vendor = self.vendors.contains(sender_id);

        if !is_vendor && !self.verified_customers.contains(sender_id) {
            tracing::info!(
                event_name = "dispatch.access_denied",
                correlation_id = %correlation_id,
                user_id = %sender_id,
                "unverified sender rejected"
            );
            self.deliver(sender_id, &texts::access_restricted()).await;
            return Ok(DispatchOutcome::AccessDenied);
        }

        if is_vendor {
            if let Some(code) = parse_accept_command(text) {
                tracing::info!(
                    event_name = "dispatch.claim_routed",
                    correlation_id = %correlation_id,
                    vendor_id = %sender_id,
                    code = %code.as_str(),
                    "vendor accept command routed to broker"
                );
                let result =
                    self.broker.claim(&VendorId(sender_id.to_owned()), &code).await?;
                return Ok(DispatchOutcome::Claim(result));
            }
        }

        tracing::debug!(
            event_name = "dispatch.dialog_routed",
            correlation_id = %correlation_id,
            user_id = %sender_id,
            "message routed to ordering dialog"
        );

        let placed = self.sessions.handle_message(sender_id, text).await?;
        match placed {
            Some(order) => {
                self.broker.publish(&order).await;
                Ok(DispatchOutcome::Dialog { order_placed: Some(order.order_id) })
            }
            None => Ok(DispatchOutcome::Dialog { order_placed: None }),
        }
    }

    async fn deliver(&self, to: &str, body: &str) {
        if let Err(error) = self.sender.send_text(to, body).await {
            tracing::warn!(
                event_name = "dispatch.delivery_failed",
                user_id = %to,
                error = %error,
                "outbound message dropped"
            );
        }
    }
}

/// Matches the vendor accept command: the word `accept` followed by either a
/// full `ORD-<digits>` id or a bare short code of at least three digits.
/// Case-insensitive, nothing trailing. Anything else falls through to the
/// ordering dialog.
pub fn parse_accept_command(text: &str) -> Option<ClaimCode> {
    let mut parts = text.split_whitespace();
    let verb = parts.next()?;
    if !verb.eq_ignore_ascii_case("accept") {
        return None;
    }

    let code = parts.next()?;
    if parts.next().is_some() {
        return None;
    }

    let code = code.to_ascii_uppercase();
    if let Some(digits) = code.strip_prefix("ORD-") {
        if !digits.is_empty() && digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Some(ClaimCode::Exact(OrderId(code)));
        }
        return None;
    }

    if code.len() >= 3 && code.bytes().all(|byte| byte.is_ascii_digit()) {
        return Some(ClaimCode::Suffix(code));
    }

    None
}
