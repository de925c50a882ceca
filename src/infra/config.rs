use std::net::SocketAddr;

use axum::http::HeaderValue;

/// Process-level configuration, read once at startup. Provider credentials
/// are NOT here: they go through the Configuration Resolver on every call so
/// that rotations apply without a restart.
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origin: HeaderValue,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let bind_addr: SocketAddr = std::env::var("BIND_ADDR")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| "127.0.0.1:3001".parse().expect("valid default bind addr"));

        let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let cors_origin: HeaderValue = std::env::var("CORS_ORIGIN")
            .unwrap_or_else(|_| "http://localhost:3000".to_string())
            .parse()
            .expect("CORS_ORIGIN must be a valid header value");

        Self {
            bind_addr,
            database_url,
            cors_origin,
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Self {
            bind_addr: "127.0.0.1:0".parse().expect("valid test bind addr"),
            database_url: "postgres://localhost/pagcore_test".to_string(),
            cors_origin: HeaderValue::from_static("http://localhost:3000"),
        }
    }
}
