//! WhatsApp Cloud API transport for dhobi:
//! - **Inbound** (`inbound`) - webhook payload decoding to `(sender, text)`
//! - **Verify** (`verify`) - the `hub.*` subscription handshake
//! - **Outbound** (`sender`) - the `MessageSender` seam and Graph API client
//! - **Texts** (`texts`) - every user-facing message string in one place
//!
//! Outbound delivery is best-effort by design: callers log failures and move
//! on, so a dropped notification never rolls back an order or a session.

pub mod inbound;
pub mod sender;
pub mod texts;
pub mod verify;

pub use inbound::{InboundMessage, WebhookEnvelope};
pub use sender::{CloudApiSender, MessageSender, RecordingSender, SendError};
pub use verify::{verify_subscription, VerifyRequest};
