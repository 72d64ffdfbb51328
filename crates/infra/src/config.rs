//! Configuration loading and representation.
//!
//! Everything comes from the process environment:
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `SERVER_ADDRESS` | `0.0.0.0:8080` | HTTP bind address (a bare port is accepted) |
//! | `USE_PERSISTENT_STORES` | `false` | Use Postgres instead of the in-memory store |
//! | `POSTGRES_CONN` / `DATABASE_URL` | none | Postgres URL, required when persistent |
//! | `POSTGRES_MAX_CONNECTIONS` | `10` | Pool size |
//! | `POSTGRES_ACQUIRE_TIMEOUT_MS` | `5000` | Max wait for a pooled connection |
//! | `DEMO_DIRECTORY` | none | JSON directory seed for the in-memory store |

use std::path::PathBuf;

use anyhow::{Context, bail};

pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub server_address: String,
    pub store: StoreBackend,
    /// Directory seed file; only read by the in-memory backend.
    pub demo_directory: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Postgres(PostgresConfig),
}

#[derive(Clone, PartialEq, Eq)]
pub struct PostgresConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_ms: u64,
}

// The URL carries credentials.
impl core::fmt::Debug for PostgresConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PostgresConfig")
            .field("url", &"<redacted>")
            .field("max_connections", &self.max_connections)
            .field("acquire_timeout_ms", &self.acquire_timeout_ms)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (tests pass a map here).
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let server_address = match lookup("SERVER_ADDRESS").filter(|v| !v.trim().is_empty()) {
            Some(addr) if addr.trim().parse::<u16>().is_ok() => format!("0.0.0.0:{}", addr.trim()),
            Some(addr) => addr.trim().to_string(),
            None => DEFAULT_SERVER_ADDRESS.to_string(),
        };

        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .with_context(|| format!("USE_PERSISTENT_STORES must be true or false, got '{raw}'"))?,
            None => false,
        };

        let store = if use_persistent {
            let Some(url) = lookup("POSTGRES_CONN").or_else(|| lookup("DATABASE_URL")) else {
                bail!("POSTGRES_CONN or DATABASE_URL must be set when USE_PERSISTENT_STORES=true");
            };
            StoreBackend::Postgres(PostgresConfig {
                url,
                max_connections: parse_or(&lookup, "POSTGRES_MAX_CONNECTIONS", 10)?,
                acquire_timeout_ms: parse_or(&lookup, "POSTGRES_ACQUIRE_TIMEOUT_MS", 5_000)?,
            })
        } else {
            StoreBackend::InMemory
        };

        let demo_directory = lookup("DEMO_DIRECTORY")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            server_address,
            store,
            demo_directory,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> anyhow::Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: core::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("invalid value for {key}: '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_to_in_memory_on_port_8080() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.server_address, DEFAULT_SERVER_ADDRESS);
        assert_eq!(cfg.store, StoreBackend::InMemory);
        assert_eq!(cfg.demo_directory, None);
    }

    #[test]
    fn demo_directory_is_read_when_set() {
        let cfg = config(&[("DEMO_DIRECTORY", " ./demo/directory.json ")]).unwrap();
        assert_eq!(cfg.demo_directory, Some(PathBuf::from("./demo/directory.json")));
        assert_eq!(config(&[("DEMO_DIRECTORY", "  ")]).unwrap().demo_directory, None);
    }

    #[test]
    fn bare_port_binds_all_interfaces() {
        let cfg = config(&[("SERVER_ADDRESS", "9090")]).unwrap();
        assert_eq!(cfg.server_address, "0.0.0.0:9090");
    }

    #[test]
    fn persistent_requires_a_url() {
        let err = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap_err();
        assert!(err.to_string().contains("POSTGRES_CONN"));
    }

    #[test]
    fn postgres_conn_wins_over_database_url() {
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("POSTGRES_CONN", "postgres://a"),
            ("DATABASE_URL", "postgres://b"),
            ("POSTGRES_MAX_CONNECTIONS", "4"),
        ])
        .unwrap();
        match cfg.store {
            StoreBackend::Postgres(pg) => {
                assert_eq!(pg.url, "postgres://a");
                assert_eq!(pg.max_connections, 4);
                assert_eq!(pg.acquire_timeout_ms, 5_000);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
    }

    #[test]
    fn debug_output_hides_the_url() {
        let pg = PostgresConfig {
            url: "postgres://user:secret@db/app".to_string(),
            max_connections: 1,
            acquire_timeout_ms: 1,
        };
        assert!(!format!("{pg:?}").contains("secret"));
    }

    #[test]
    fn malformed_flag_is_rejected() {
        assert!(config(&[("USE_PERSISTENT_STORES", "yes")]).is_err());
    }
}
