use std::str::FromStr;

/// Which table backs the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    /// Google Sheets worksheet (production).
    Sheets,
    /// Process-local table, empty at startup. For local development.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sheets" => Ok(Self::Sheets),
            "memory" => Ok(Self::Memory),
            other => Err(format!("unknown store backend '{other}'")),
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development. Store
/// connection settings live in `roster_store::config::SheetsConfig`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Record store backend (default: `sheets`).
    pub store: StoreBackend,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `3000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `ROSTER_STORE`         | `sheets`                   |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let store: StoreBackend = std::env::var("ROSTER_STORE")
            .unwrap_or_else(|_| "sheets".into())
            .parse()
            .unwrap_or_else(|e| panic!("ROSTER_STORE: {e}"));

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            store,
        }
    }
}
