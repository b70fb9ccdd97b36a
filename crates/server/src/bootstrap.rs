use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use dhobi_bot::{AssignmentBroker, Dispatcher, SessionService};
use dhobi_core::catalog::Catalog;
use dhobi_core::config::{AppConfig, ConfigError, LoadOptions};
use dhobi_core::dialog::DialogEngine;
use dhobi_db::{
    connect_with_settings, migrations, DbPool, OrderRepository, SqlOrderRepository,
    SqlVendorRepository, VendorRepository,
};
use dhobi_whatsapp::{CloudApiSender, MessageSender};

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub dispatcher: Arc<Dispatcher>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect_with_settings(
        &config.database.url,
        config.database.max_connections,
        config.database.timeout_secs,
    )
    .await
    .map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let sender: Arc<dyn MessageSender> = Arc::new(CloudApiSender::new(&config.whatsapp));
    let orders: Arc<dyn OrderRepository> = Arc::new(SqlOrderRepository::new(db_pool.clone()));
    let vendors: Arc<dyn VendorRepository> = Arc::new(SqlVendorRepository::new(db_pool.clone()));

    let sessions = Arc::new(SessionService::new(
        DialogEngine::new(Catalog::standard()),
        Arc::clone(&orders),
        Arc::clone(&sender),
        &config.session,
    ));
    let broker = Arc::new(AssignmentBroker::new(
        orders,
        vendors,
        Arc::clone(&sender),
        config.parties.vendors.clone(),
    ));
    let dispatcher = Arc::new(Dispatcher::new(sessions, broker, sender, &config.parties));

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        vendor_count = config.parties.vendors.len(),
        verified_customer_count = config.parties.verified_customers.len(),
        "dispatcher wired to session service and assignment broker"
    );

    Ok(Application { config, db_pool, dispatcher })
}
