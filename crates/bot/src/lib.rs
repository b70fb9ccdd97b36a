//! Orchestration layer: routes each inbound `(sender, text)` pair to the
//! ordering dialog or the vendor claim path, owns per-user session
//! serialization, and runs the first-to-claim assignment protocol.

pub mod broker;
pub mod dispatch;
pub mod sessions;

pub use broker::{AssignmentBroker, AssignmentResult, ClaimCode};
pub use dispatch::{parse_accept_command, DispatchOutcome, Dispatcher};
pub use sessions::SessionService;
