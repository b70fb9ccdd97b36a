use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub whatsapp: WhatsAppConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
    pub parties: PartiesConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct WhatsAppConfig {
    pub access_token: SecretString,
    pub verify_token: SecretString,
    pub phone_number_id: String,
    pub api_base_url: String,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub idle_timeout_secs: u64,
    pub replay_guard_secs: u64,
}

/// Static access-control lists: who may order, and who may claim.
#[derive(Clone, Debug, Default)]
pub struct PartiesConfig {
    pub verified_customers: Vec<String>,
    pub vendors: Vec<String>,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub database_url: Option<String>,
    pub log_level: Option<String>,
    pub access_token: Option<String>,
    pub verify_token: Option<String>,
    pub phone_number_id: Option<String>,
    pub verified_customers: Option<Vec<String>>,
    pub vendors: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://dhobi.db".to_string(),
                max_connections: 5,
                timeout_secs: 30,
            },
            whatsapp: WhatsAppConfig {
                access_token: String::new().into(),
                verify_token: String::new().into(),
                phone_number_id: String::new(),
                api_base_url: "https://graph.facebook.com/v19.0".to_string(),
            },
            server: ServerConfig { bind_address: "127.0.0.1".to_string(), port: 10000 },
            session: SessionConfig { idle_timeout_secs: 1800, replay_guard_secs: 600 },
            parties: PartiesConfig::default(),
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    /// Precedence, lowest to highest: defaults, `dhobi.toml`, `DHOBI_*`
    /// environment variables, programmatic overrides.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("dhobi.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(database) = patch.database {
            if let Some(url) = database.url {
                self.database.url = url;
            }
            if let Some(max_connections) = database.max_connections {
                self.database.max_connections = max_connections;
            }
            if let Some(timeout_secs) = database.timeout_secs {
                self.database.timeout_secs = timeout_secs;
            }
        }

        if let Some(whatsapp) = patch.whatsapp {
            if let Some(access_token_value) = whatsapp.access_token {
                self.whatsapp.access_token = access_token_value.into();
            }
            if let Some(verify_token_value) = whatsapp.verify_token {
                self.whatsapp.verify_token = verify_token_value.into();
            }
            if let Some(phone_number_id) = whatsapp.phone_number_id {
                self.whatsapp.phone_number_id = phone_number_id;
            }
            if let Some(api_base_url) = whatsapp.api_base_url {
                self.whatsapp.api_base_url = api_base_url;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
        }

        if let Some(session) = patch.session {
            if let Some(idle_timeout_secs) = session.idle_timeout_secs {
                self.session.idle_timeout_secs = idle_timeout_secs;
            }
            if let Some(replay_guard_secs) = session.replay_guard_secs {
                self.session.replay_guard_secs = replay_guard_secs;
            }
        }

        if let Some(parties) = patch.parties {
            if let Some(verified_customers) = parties.verified_customers {
                self.parties.verified_customers = verified_customers;
            }
            if let Some(vendors) = parties.vendors {
                self.parties.vendors = vendors;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("DHOBI_DATABASE_URL") {
            self.database.url = value;
        }
        if let Some(value) = read_env("DHOBI_DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = parse_u32("DHOBI_DATABASE_MAX_CONNECTIONS", &value)?;
        }
        if let Some(value) = read_env("DHOBI_DATABASE_TIMEOUT_SECS") {
            self.database.timeout_secs = parse_u64("DHOBI_DATABASE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("DHOBI_WHATSAPP_ACCESS_TOKEN") {
            self.whatsapp.access_token = value.into();
        }
        if let Some(value) = read_env("DHOBI_WHATSAPP_VERIFY_TOKEN") {
            self.whatsapp.verify_token = value.into();
        }
        if let Some(value) = read_env("DHOBI_WHATSAPP_PHONE_NUMBER_ID") {
            self.whatsapp.phone_number_id = value;
        }
        if let Some(value) = read_env("DHOBI_WHATSAPP_API_BASE_URL") {
            self.whatsapp.api_base_url = value;
        }

        if let Some(value) = read_env("DHOBI_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("DHOBI_SERVER_PORT") {
            self.server.port = parse_u16("DHOBI_SERVER_PORT", &value)?;
        }

        if let Some(value) = read_env("DHOBI_SESSION_IDLE_TIMEOUT_SECS") {
            self.session.idle_timeout_secs = parse_u64("DHOBI_SESSION_IDLE_TIMEOUT_SECS", &value)?;
        }
        if let Some(value) = read_env("DHOBI_SESSION_REPLAY_GUARD_SECS") {
            self.session.replay_guard_secs = parse_u64("DHOBI_SESSION_REPLAY_GUARD_SECS", &value)?;
        }

        if let Some(value) = read_env("DHOBI_VERIFIED_CUSTOMERS") {
            self.parties.verified_customers = parse_id_list(&value);
        }
        if let Some(value) = read_env("DHOBI_VENDORS") {
            self.parties.vendors = parse_id_list(&value);
        }

        let log_level = read_env("DHOBI_LOGGING_LEVEL").or_else(|| read_env("DHOBI_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format = read_env("DHOBI_LOGGING_FORMAT").or_else(|| read_env("DHOBI_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(database_url) = overrides.database_url {
            self.database.url = database_url;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(access_token) = overrides.access_token {
            self.whatsapp.access_token = access_token.into();
        }
        if let Some(verify_token) = overrides.verify_token {
            self.whatsapp.verify_token = verify_token.into();
        }
        if let Some(phone_number_id) = overrides.phone_number_id {
            self.whatsapp.phone_number_id = phone_number_id;
        }
        if let Some(verified_customers) = overrides.verified_customers {
            self.parties.verified_customers = verified_customers;
        }
        if let Some(vendors) = overrides.vendors {
            self.parties.vendors = vendors;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_database(&self.database)?;
        validate_whatsapp(&self.whatsapp)?;
        validate_server(&self.server)?;
        validate_session(&self.session)?;
        validate_parties(&self.parties)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("dhobi.toml"), PathBuf::from("config/dhobi.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_database(database: &DatabaseConfig) -> Result<(), ConfigError> {
    let url = database.url.trim();
    let sqlite_url =
        url.starts_with("sqlite://") || url.starts_with("sqlite::") || url == ":memory:";
    if !sqlite_url {
        return Err(ConfigError::Validation(
            "database.url must be a sqlite URL (`sqlite://...`, `sqlite::...`, or `:memory:`)"
                .to_string(),
        ));
    }

    if database.max_connections == 0 {
        return Err(ConfigError::Validation(
            "database.max_connections must be greater than zero".to_string(),
        ));
    }

    if database.timeout_secs == 0 || database.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "database.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_whatsapp(whatsapp: &WhatsAppConfig) -> Result<(), ConfigError> {
    if whatsapp.access_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.access_token is required (Meta app dashboard > WhatsApp > API Setup)"
                .to_string(),
        ));
    }

    if whatsapp.verify_token.expose_secret().trim().is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.verify_token is required; it must match the token entered in the webhook subscription".to_string(),
        ));
    }

    let phone_number_id = whatsapp.phone_number_id.trim();
    if phone_number_id.is_empty() {
        return Err(ConfigError::Validation(
            "whatsapp.phone_number_id is required".to_string(),
        ));
    }
    if !phone_number_id.bytes().all(|byte| byte.is_ascii_digit()) {
        return Err(ConfigError::Validation(
            "whatsapp.phone_number_id must be numeric".to_string(),
        ));
    }

    if !whatsapp.api_base_url.starts_with("http://")
        && !whatsapp.api_base_url.starts_with("https://")
    {
        return Err(ConfigError::Validation(
            "whatsapp.api_base_url must start with http:// or https://".to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation(
            "server.bind_address must not be empty".to_string(),
        ));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation(
            "server.port must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_session(session: &SessionConfig) -> Result<(), ConfigError> {
    if session.idle_timeout_secs == 0 || session.idle_timeout_secs > 86_400 {
        return Err(ConfigError::Validation(
            "session.idle_timeout_secs must be in range 1..=86400".to_string(),
        ));
    }

    if session.replay_guard_secs == 0 || session.replay_guard_secs > session.idle_timeout_secs {
        return Err(ConfigError::Validation(
            "session.replay_guard_secs must be in range 1..=session.idle_timeout_secs"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_parties(parties: &PartiesConfig) -> Result<(), ConfigError> {
    if parties.vendors.is_empty() {
        return Err(ConfigError::Validation(
            "parties.vendors must list at least one vendor number".to_string(),
        ));
    }

    if parties.verified_customers.is_empty() {
        return Err(ConfigError::Validation(
            "parties.verified_customers must list at least one customer number".to_string(),
        ));
    }

    let blank_entry = parties
        .vendors
        .iter()
        .chain(parties.verified_customers.iter())
        .any(|entry| entry.trim().is_empty());
    if blank_entry {
        return Err(ConfigError::Validation(
            "parties lists must not contain blank entries".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_id_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_owned)
        .collect()
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.parse::<u16>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u32(key: &str, value: &str) -> Result<u32, ConfigError> {
    value.parse::<u32>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    database: Option<DatabasePatch>,
    whatsapp: Option<WhatsAppPatch>,
    server: Option<ServerPatch>,
    session: Option<SessionPatch>,
    parties: Option<PartiesPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct DatabasePatch {
    url: Option<String>,
    max_connections: Option<u32>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct WhatsAppPatch {
    access_token: Option<String>,
    verify_token: Option<String>,
    phone_number_id: Option<String>,
    api_base_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
}

#[derive(Debug, Default, Deserialize)]
struct SessionPatch {
    idle_timeout_secs: Option<u64>,
    replay_guard_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartiesPatch {
    verified_customers: Option<Vec<String>>,
    vendors: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::io;
    use std::sync::{Mutex, OnceLock};

    use secrecy::ExposeSecret;
    use tempfile::TempDir;

    use super::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};

    static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();

    fn env_lock() -> &'static Mutex<()> {
        ENV_LOCK.get_or_init(|| Mutex::new(()))
    }

    const BASE_VARS: &[(&str, &str)] = &[
        ("DHOBI_WHATSAPP_ACCESS_TOKEN", "EAAG-test-token"),
        ("DHOBI_WHATSAPP_VERIFY_TOKEN", "hub-verify-secret"),
        ("DHOBI_WHATSAPP_PHONE_NUMBER_ID", "115550001111"),
        ("DHOBI_VERIFIED_CUSTOMERS", "919916814517,917358791933"),
        ("DHOBI_VENDORS", "919043331484"),
    ];

    fn set_base_vars() {
        for (key, value) in BASE_VARS {
            env::set_var(key, value);
        }
    }

    fn clear_vars(vars: &[&str]) {
        for var in vars {
            env::remove_var(var);
        }
    }

    fn clear_base_vars() {
        for (key, _) in BASE_VARS {
            env::remove_var(key);
        }
    }

    fn ensure(condition: bool, message: &'static str) -> Result<(), String> {
        if condition {
            Ok(())
        } else {
            Err(message.to_string())
        }
    }

    #[test]
    fn defaults_plus_required_env_produce_a_valid_config() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.database.url == "sqlite://dhobi.db", "default database url expected")?;
            ensure(config.server.port == 10000, "default port expected")?;
            ensure(
                config.parties.verified_customers
                    == vec!["919916814517".to_string(), "917358791933".to_string()],
                "customer list should parse from comma-separated env value",
            )?;
            ensure(
                config.parties.vendors == vec!["919043331484".to_string()],
                "vendor list should parse from env value",
            )?;
            Ok(())
        })();

        clear_base_vars();
        result
    }

    #[test]
    fn file_load_supports_env_interpolation() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();
        env::set_var("TEST_WA_ACCESS_TOKEN", "EAAG-from-file-env");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dhobi.toml");
            fs::write(
                &path,
                r#"
[whatsapp]
access_token = "${TEST_WA_ACCESS_TOKEN}"
"#,
            )
            .map_err(|err| err.to_string())?;

            // The env var for the token itself must not shadow the file.
            env::remove_var("DHOBI_WHATSAPP_ACCESS_TOKEN");

            let config =
                AppConfig::load(LoadOptions { config_path: Some(path), ..LoadOptions::default() })
                    .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.whatsapp.access_token.expose_secret() == "EAAG-from-file-env",
                "access token should be interpolated from the environment",
            )?;
            Ok(())
        })();

        clear_base_vars();
        clear_vars(&["TEST_WA_ACCESS_TOKEN"]);
        result
    }

    #[test]
    fn precedence_defaults_file_env_overrides() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();
        env::set_var("DHOBI_DATABASE_URL", "sqlite://from-env.db");

        let result = (|| -> Result<(), String> {
            let dir = TempDir::new().map_err(|err: io::Error| err.to_string())?;
            let path = dir.path().join("dhobi.toml");
            fs::write(
                &path,
                r#"
[database]
url = "sqlite://from-file.db"

[logging]
level = "warn"
"#,
            )
            .map_err(|err| err.to_string())?;

            let config = AppConfig::load(LoadOptions {
                config_path: Some(path),
                overrides: ConfigOverrides {
                    database_url: Some("sqlite://from-override.db".to_string()),
                    log_level: Some("debug".to_string()),
                    ..ConfigOverrides::default()
                },
                ..LoadOptions::default()
            })
            .map_err(|err| format!("config load failed: {err}"))?;

            ensure(
                config.database.url == "sqlite://from-override.db",
                "programmatic override should win over file and env",
            )?;
            ensure(config.logging.level == "debug", "override log level should win")?;
            Ok(())
        })();

        clear_base_vars();
        clear_vars(&["DHOBI_DATABASE_URL"]);
        result
    }

    #[test]
    fn validation_requires_vendor_and_customer_allowlists() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();
        env::remove_var("DHOBI_VENDORS");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => {
                    return Err("expected validation failure but config load succeeded".to_string())
                }
                Err(error) => error,
            };
            let mentions_vendors = matches!(
                error,
                ConfigError::Validation(ref message) if message.contains("parties.vendors")
            );
            ensure(mentions_vendors, "validation failure should mention parties.vendors")
        })();

        clear_base_vars();
        result
    }

    #[test]
    fn validation_rejects_non_numeric_phone_number_id() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();
        env::set_var("DHOBI_WHATSAPP_PHONE_NUMBER_ID", "not-a-number");

        let result = (|| -> Result<(), String> {
            let error = match AppConfig::load(LoadOptions::default()) {
                Ok(_) => return Err("expected validation failure".to_string()),
                Err(error) => error,
            };
            ensure(
                error.to_string().contains("phone_number_id"),
                "validation failure should mention phone_number_id",
            )
        })();

        clear_base_vars();
        result
    }

    #[test]
    fn secret_values_are_not_leaked_by_debug() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;
            let debug = format!("{config:?}");

            ensure(
                !debug.contains("EAAG-test-token"),
                "debug output should not contain the access token",
            )?;
            ensure(
                !debug.contains("hub-verify-secret"),
                "debug output should not contain the verify token",
            )?;
            ensure(
                matches!(config.logging.format, LogFormat::Compact),
                "default logging format should be compact",
            )?;
            Ok(())
        })();

        clear_base_vars();
        result
    }

    #[test]
    fn logging_env_aliases_are_supported() -> Result<(), String> {
        let _guard = env_lock().lock().map_err(|_| "env lock is poisoned".to_string())?;
        set_base_vars();
        env::set_var("DHOBI_LOG_LEVEL", "warn");
        env::set_var("DHOBI_LOG_FORMAT", "pretty");

        let result = (|| -> Result<(), String> {
            let config = AppConfig::load(LoadOptions::default())
                .map_err(|err| format!("config load failed: {err}"))?;

            ensure(config.logging.level == "warn", "log level should come from the alias var")?;
            ensure(
                matches!(config.logging.format, LogFormat::Pretty),
                "log format should come from the alias var",
            )?;
            Ok(())
        })();

        clear_base_vars();
        clear_vars(&["DHOBI_LOG_LEVEL", "DHOBI_LOG_FORMAT"]);
        result
    }
}
