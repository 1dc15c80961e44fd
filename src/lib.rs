//! Book Catalog
//!
//! A small book catalog with:
//! - JWT-protected CRUD endpoints over an in-memory record store
//! - An in-process event bus that announces every successful mutation
//! - A WebSocket endpoint fanning those events out to every connected client
//! - A notification client that keeps a live, newest-first feed

pub mod api;
pub mod auth;
pub mod books;
pub mod events;
pub mod notifications;

#[cfg(test)]
pub(crate) mod test_helpers;

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub events: EventsYamlConfig,
    pub books: BooksYamlConfig,
    /// Auth section — if absent, auth_config will be None (deny-by-default)
    pub auth: Option<AuthConfig>,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 3000,
        }
    }
}

/// Event bus / WebSocket configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsYamlConfig {
    /// Events buffered per subscriber before it starts losing them
    pub subscriber_capacity: usize,
    /// Seconds between WebSocket pings
    pub ping_interval_secs: u64,
}

impl Default for EventsYamlConfig {
    fn default() -> Self {
        Self {
            subscriber_capacity: events::DEFAULT_CAPACITY,
            ping_interval_secs: 30,
        }
    }
}

/// Record store configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BooksYamlConfig {
    /// Start with the two sample books
    pub seed: bool,
}

impl Default for BooksYamlConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

/// Authentication configuration.
///
/// Users are declared in config. The `password_hash` field can contain either:
/// - A bcrypt hash (starts with `$2b$`, `$2a$` or `$2y$`) → used as-is
/// - A plaintext password → hashed with bcrypt at startup (with a warning log)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT signing secret (HS256, minimum 32 characters)
    pub jwt_secret: String,
    /// JWT and cookie lifetime in seconds (default: 86400 = 24h)
    #[serde(default = "default_jwt_expiry")]
    pub jwt_expiry_secs: u64,
    /// Add the `Secure` flag to the session cookie (HTTPS deployments)
    #[serde(default)]
    pub secure_cookies: bool,
    #[serde(default)]
    pub users: Vec<UserAccountConfig>,
}

/// One account allowed to log in
#[derive(Debug, Clone, Deserialize)]
pub struct UserAccountConfig {
    pub username: String,
    /// Bcrypt hash or plaintext password (hashed at startup if plaintext)
    pub password_hash: String,
}

fn default_jwt_expiry() -> u64 {
    86400 // 24 hours
}

fn is_bcrypt_hash(value: &str) -> bool {
    ["$2a$", "$2b$", "$2y$"].iter().any(|p| value.starts_with(p))
}

impl AuthConfig {
    /// Check a username/password pair against the configured accounts.
    pub fn verify_credentials(&self, username: &str, password: &str) -> bool {
        self.users
            .iter()
            .find(|u| u.username == username)
            .map(|u| bcrypt::verify(password, &u.password_hash).unwrap_or(false))
            .unwrap_or(false)
    }

    /// Replace plaintext passwords with bcrypt hashes.
    pub fn hash_plaintext_passwords(&mut self, cost: u32) -> Result<()> {
        for user in self.users.iter_mut() {
            if !is_bcrypt_hash(&user.password_hash) {
                tracing::warn!(
                    username = %user.username,
                    "Plaintext password in config, hashing it at startup"
                );
                user.password_hash = bcrypt::hash(&user.password_hash, cost)
                    .with_context(|| format!("Failed to hash password for {}", user.username))?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Runtime config (what the application actually uses)
// ============================================================================

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub subscriber_capacity: usize,
    pub ping_interval_secs: u64,
    pub seed_books: bool,
    /// Auth config — None means deny-by-default for mutations
    pub auth_config: Option<AuthConfig>,
}

impl Config {
    /// Load configuration from an optional YAML file, then override with env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. If the file doesn't
    /// exist, falls back to pure env var / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        let yaml = Self::load_yaml(yaml_path);

        let mut auth_config = yaml.auth;
        if let Some(ref mut auth) = auth_config {
            if let Ok(secret) = std::env::var("JWT_SECRET") {
                auth.jwt_secret = secret;
            }
            auth.hash_plaintext_passwords(bcrypt::DEFAULT_COST)?;
            if auth.jwt_secret.len() < 32 {
                tracing::warn!("jwt_secret is shorter than 32 characters");
            }
        }

        let server_port = std::env::var("SERVER_PORT")
            .or_else(|_| std::env::var("PORT"))
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(yaml.server.port);

        Ok(Self {
            server_host: std::env::var("SERVER_HOST").unwrap_or(yaml.server.host),
            server_port,
            subscriber_capacity: yaml.events.subscriber_capacity,
            ping_interval_secs: yaml.events.ping_interval_secs,
            seed_books: yaml.books.seed,
            auth_config,
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Server bootstrap
// ============================================================================

/// Build the shared server state: one store, one bus, one producer.
///
/// The bus is created here and handed by `Arc` to both the producer and the
/// WebSocket adapter; nothing looks it up globally.
pub fn build_state(config: &Config) -> api::CatalogState {
    let store: Arc<dyn books::BookStore> = if config.seed_books {
        Arc::new(books::InMemoryBookStore::seeded())
    } else {
        Arc::new(books::InMemoryBookStore::new())
    };
    let event_bus = Arc::new(events::EventBus::new(config.subscriber_capacity));
    let books = Arc::new(books::BookManager::with_event_emitter(
        store,
        event_bus.clone(),
    ));

    Arc::new(api::ServerState {
        books,
        event_bus,
        auth_config: config.auth_config.clone(),
        ping_interval: Duration::from_secs(config.ping_interval_secs.max(1)),
    })
}

/// Bind the HTTP listener and serve until Ctrl-C.
pub async fn start_server(config: Config) -> Result<()> {
    if config.auth_config.is_none() {
        tracing::warn!("No auth section configured: mutation endpoints will refuse every request");
    }

    let state = build_state(&config);
    let app = api::create_router(state);

    let addr = format!("{}:{}", config.server_host, config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    let local = listener.local_addr()?;

    tracing::info!("Book catalog listening on http://{}", local);
    tracing::info!("Real-time events at ws://{}{}", local, api::WS_EVENTS_PATH);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

// ============================================================================
// Tests
// ============================================================================
