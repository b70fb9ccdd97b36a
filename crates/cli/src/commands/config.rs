use dhobi_core::config::{AppConfig, LoadOptions};
use secrecy::ExposeSecret;

pub fn run() -> String {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => return format!("config validation failed: {error}"),
    };

    let lines = vec![
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        render("database.url", &config.database.url),
        render("database.max_connections", &config.database.max_connections.to_string()),
        render("database.timeout_secs", &config.database.timeout_secs.to_string()),
        render(
            "whatsapp.access_token",
            &redact_token(config.whatsapp.access_token.expose_secret()),
        ),
        render(
            "whatsapp.verify_token",
            &redact_token(config.whatsapp.verify_token.expose_secret()),
        ),
        render("whatsapp.phone_number_id", &config.whatsapp.phone_number_id),
        render("whatsapp.api_base_url", &config.whatsapp.api_base_url),
        render("server.bind_address", &config.server.bind_address),
        render("server.port", &config.server.port.to_string()),
        render("session.idle_timeout_secs", &config.session.idle_timeout_secs.to_string()),
        render("session.replay_guard_secs", &config.session.replay_guard_secs.to_string()),
        render(
            "parties.verified_customers",
            &format!("{} entries", config.parties.verified_customers.len()),
        ),
        render("parties.vendors", &format!("{} entries", config.parties.vendors.len())),
        render("logging.level", &config.logging.level),
        render("logging.format", &format!("{:?}", config.logging.format)),
    ];

    lines.join("\n")
}

fn render(key: &str, value: &str) -> String {
    format!("- {key} = {value}")
}

/// Keeps enough of the token to recognize it, never enough to use it.
fn redact_token(token: &str) -> String {
    if token.is_empty() {
        return "<unset>".to_string();
    }
    let prefix: String = token.chars().take(4).collect();
    format!("{prefix}***")
}
