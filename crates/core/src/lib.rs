//! Domain core for dhobi: the ordering dialog, catalog pricing, and the
//! order/vendor lifecycle types. Everything here is synchronous and free of
//! I/O; persistence and transport live in the sibling crates.

pub mod catalog;
pub mod config;
pub mod dialog;
pub mod domain;
pub mod errors;

pub use catalog::{parse_line_item, Catalog, CatalogEntry, LineItemParseError};
pub use dialog::{DialogEffect, DialogEngine, DialogReply, DialogTurn};
pub use domain::order::{
    CustomerInfo, LineItem, Order, OrderId, OrderIdGenerator, OrderStatus,
};
pub use domain::session::{DialogStep, Session};
pub use domain::vendor::{Vendor, VendorId};
pub use errors::{ApplicationError, DomainError};
