//! SQLite persistence for dhobi: pool management, embedded migrations, and
//! the order/vendor repositories. The claim compare-and-set lives here — it
//! is the one query the assignment protocol's correctness hangs on.

pub mod connection;
pub mod migrations;
pub mod repositories;

pub use connection::{connect, connect_with_settings, DbPool};
pub use repositories::{
    ClaimOutcome, InMemoryOrderRepository, InMemoryVendorRepository, OrderRepository,
    RepositoryError, SqlOrderRepository, SqlVendorRepository, VendorRepository,
};
