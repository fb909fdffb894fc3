// Configuration module entry point
// Manages application configuration and runtime state

mod state;
mod types;

use std::net::SocketAddr;

use crate::error::ServerError;

// Re-export public types
pub use state::AppState;
pub use types::Config;

/// Config file used when no path is given on the command line
pub const DEFAULT_CONFIG_PATH: &str = "config";

impl Config {
    /// Load configuration from specified file path (without extension)
    /// Default config file is "config.toml" when no path specified
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("COURSES")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive_timeout", 75)?
            .set_default("performance.read_timeout", 30)?
            .set_default("performance.write_timeout", 30)?
            .set_default("http.server_name", "courses-api")?
            .set_default("http.enable_cors", false)?
            .set_default("http.max_body_size", 102_400)? // 100KB
            .set_default("docs.enabled", true)?
            .set_default("docs.path", "/docs")?
            .build()?;

        settings.try_deserialize()
    }

    /// Load configuration using the first command line argument as file path
    pub fn load() -> Result<Self, ServerError> {
        let path = std::env::args()
            .nth(1)
            .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string());
        Ok(Self::load_from(&path)?)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ServerError> {
        let addr = format!("{}:{}", self.server.host, self.server.port);
        addr.parse()
            .map_err(|source| ServerError::InvalidAddress { addr, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, PoisonError};

    // Environment variables are process-wide; tests that read or set them serialize here
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    fn env_guard() -> MutexGuard<'static, ()> {
        ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[test]
    fn test_defaults_without_file() {
        let _guard = env_guard();
        let cfg = Config::load_from("does-not-exist/courses").unwrap();
        assert_eq!(cfg.server.port, 3000);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.server.workers.is_none());
        assert_eq!(cfg.logging.level, "info");
        assert_eq!(cfg.logging.access_log_format, "combined");
        assert_eq!(cfg.http.max_body_size, 102_400);
        assert!(cfg.docs.enabled);
        assert_eq!(cfg.docs.spec_path(), "/docs/openapi.json");
    }

    #[test]
    fn test_env_overrides_defaults() {
        let _guard = env_guard();
        std::env::set_var("COURSES_SERVER__PORT", "4321");
        std::env::set_var("COURSES_HTTP__MAX_BODY_SIZE", "204800");
        let loaded = Config::load_from("does-not-exist/courses");
        std::env::remove_var("COURSES_SERVER__PORT");
        std::env::remove_var("COURSES_HTTP__MAX_BODY_SIZE");

        let cfg = loaded.unwrap();
        assert_eq!(cfg.server.port, 4321);
        assert_eq!(cfg.http.max_body_size, 204_800);
        // Untouched keys keep their defaults
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn test_file_overrides_defaults() {
        let _guard = env_guard();
        let base = std::env::temp_dir().join(format!("courses-config-{}", std::process::id()));
        let file = base.with_extension("toml");
        std::fs::write(
            &file,
            "[server]\nport = 8088\n\n[logging]\naccess_log_format = \"json\"\n\n[docs]\npath = \"/api-docs\"\n",
        )
        .unwrap();

        let loaded = Config::load_from(base.to_str().unwrap());
        std::fs::remove_file(&file).unwrap();

        let cfg = loaded.unwrap();
        assert_eq!(cfg.server.port, 8088);
        assert_eq!(cfg.logging.access_log_format, "json");
        assert_eq!(cfg.docs.spec_path(), "/api-docs/openapi.json");
        // Keys absent from the file fall back to defaults
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.http.max_body_size, 102_400);
    }

    #[test]
    fn test_socket_addr() {
        let mut cfg = Config::load_from("does-not-exist/courses").unwrap();
        cfg.server.host = "127.0.0.1".to_string();
        cfg.server.port = 4000;
        assert_eq!(
            cfg.get_socket_addr().unwrap(),
            "127.0.0.1:4000".parse::<SocketAddr>().unwrap()
        );

        cfg.server.host = "not a host".to_string();
        assert!(matches!(
            cfg.get_socket_addr(),
            Err(ServerError::InvalidAddress { .. })
        ));
    }
}
