use std::str::FromStr;

use anyhow::{Context, Result};

// ---------------------------------------------------------------------------
// StorageBackend
// ---------------------------------------------------------------------------

/// Which `Store` implementation the server runs against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres,
    Memory,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "postgres" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(anyhow::anyhow!("unknown storage backend: {other:?}")),
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_backend: StorageBackend,
    /// `DATABASE_URL`, or composed from the `DB_*` variables when unset.
    pub database_url: String,
    pub db_max_connections: u32,
    pub server_host: String,
    pub server_port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let database_url = match std::env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => compose_database_url(&DbParts {
                user: optional("DB_USER", "postgres"),
                password: optional("DB_PASSWORD", "postgres"),
                host: optional("DB_HOST", "localhost"),
                port: optional("DB_PORT", "15432")
                    .parse()
                    .context("DB_PORT must be a valid port number")?,
                name: optional("DB_NAME", "sensor"),
            }),
        };

        Ok(Self {
            storage_backend: optional("STORAGE_BACKEND", "postgres")
                .parse()
                .context("STORAGE_BACKEND must be 'postgres' or 'memory'")?,
            database_url,
            db_max_connections: optional("DB_MAX_CONNECTIONS", "10")
                .parse()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            server_host: optional("SERVER_HOST", "0.0.0.0"),
            server_port: optional("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
        })
    }
}

/// Connection pieces used when `DATABASE_URL` is not set.
#[derive(Debug, Clone, PartialEq, Eq)]
struct DbParts {
    user: String,
    password: String,
    host: String,
    port: u16,
    name: String,
}

fn compose_database_url(parts: &DbParts) -> String {
    format!(
        "postgres://{}:{}@{}:{}/{}?sslmode=disable",
        parts.user, parts.password, parts.host, parts.port, parts.name
    )
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}
