use std::env;

use crate::rate_limiter::RateLimitConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub log_level: String,
    pub log_format: LogFormat,
    pub cors_origins: Vec<String>,
    pub mongodb_uri: String,
    pub database: String,
    /// Whether forwarded-for headers from the reverse proxy are honoured
    /// when identifying a client for rate limiting.
    pub trust_proxy: bool,
    pub contact_limit: RateLimitConfig,
}

#[derive(Debug, Clone)]
pub enum LogFormat {
    Text,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            log_level: "pawmart_api=debug,tower_http=debug".to_string(),
            log_format: LogFormat::Json,
            cors_origins: vec!["*".to_string()],
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database: "PawMart".to_string(),
            trust_proxy: true,
            contact_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(host) = env::var("PAWMART_HOST") {
            config.host = host;
        }

        if let Ok(port_str) = env::var("PORT").or_else(|_| env::var("PAWMART_PORT")) {
            if let Ok(port) = port_str.parse::<u16>() {
                config.port = port;
            } else {
                eprintln!(
                    "Warning: Invalid PORT value '{}', using default {}",
                    port_str, config.port
                );
            }
        }

        if let Ok(log_level) = env::var("RUST_LOG") {
            config.log_level = log_level;
        } else if let Ok(log_level) = env::var("PAWMART_LOG_LEVEL") {
            config.log_level = log_level;
        }

        if let Ok(log_format) = env::var("PAWMART_LOG_FORMAT") {
            config.log_format = match log_format.to_lowercase().as_str() {
                "text" | "plain" => LogFormat::Text,
                "json" => LogFormat::Json,
                _ => {
                    eprintln!(
                        "Warning: Invalid PAWMART_LOG_FORMAT value '{}', using default JSON",
                        log_format
                    );
                    LogFormat::Json
                }
            };
        }

        if let Ok(cors_origins) = env::var("PAWMART_CORS_ORIGINS") {
            config.cors_origins = cors_origins
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        if let Ok(uri) = env::var("PAWMART_MONGODB_URI") {
            config.mongodb_uri = uri;
        }

        if let Ok(database) = env::var("PAWMART_DATABASE") {
            config.database = database;
        }

        if let Ok(trust_proxy) = env::var("PAWMART_TRUST_PROXY") {
            config.trust_proxy = matches!(trust_proxy.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        if let Ok(window_str) = env::var("PAWMART_CONTACT_WINDOW_SECONDS") {
            if let Ok(window) = window_str.parse::<i64>() {
                config.contact_limit.window_seconds = window;
            } else {
                eprintln!(
                    "Warning: Invalid PAWMART_CONTACT_WINDOW_SECONDS value '{}', using default {}",
                    window_str, config.contact_limit.window_seconds
                );
            }
        }

        if let Ok(max_str) = env::var("PAWMART_CONTACT_MAX_REQUESTS") {
            if let Ok(max) = max_str.parse::<i64>() {
                config.contact_limit.max_requests = max;
            } else {
                eprintln!(
                    "Warning: Invalid PAWMART_CONTACT_MAX_REQUESTS value '{}', using default {}",
                    max_str, config.contact_limit.max_requests
                );
            }
        }

        if let Ok(cleanup_str) = env::var("PAWMART_CONTACT_CLEANUP_INTERVAL_SECONDS") {
            if let Ok(cleanup) = cleanup_str.parse::<i64>() {
                config.contact_limit.cleanup_interval_seconds = cleanup;
            } else {
                eprintln!(
                    "Warning: Invalid PAWMART_CONTACT_CLEANUP_INTERVAL_SECONDS value '{}', using default {}",
                    cleanup_str, config.contact_limit.cleanup_interval_seconds
                );
            }
        }

        config
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn server_url(&self) -> String {
        if self.port == 80 {
            format!("http://{}", self.host)
        } else if self.port == 443 {
            format!("https://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database, "PawMart");
        assert!(matches!(config.log_format, LogFormat::Json));
        assert_eq!(config.cors_origins, vec!["*"]);
        assert!(config.trust_proxy);
        assert_eq!(config.contact_limit.max_requests, 1);
        assert_eq!(config.contact_limit.window_seconds, 600);
    }

    #[test]
    fn test_bind_address() {
        let config = Config {
            host: "localhost".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.bind_address(), "localhost:3000");
    }

    #[test]
    fn test_server_url() {
        let config = Config {
            host: "example.com".to_string(),
            port: 3000,
            ..Default::default()
        };
        assert_eq!(config.server_url(), "http://example.com:3000");

        let config_80 = Config {
            host: "example.com".to_string(),
            port: 80,
            ..Default::default()
        };
        assert_eq!(config_80.server_url(), "http://example.com");
    }

    #[test]
    fn test_config_from_env() {
        // Save original values
        let original_host = env::var("PAWMART_HOST").ok();
        let original_database = env::var("PAWMART_DATABASE").ok();
        let original_trust = env::var("PAWMART_TRUST_PROXY").ok();
        let original_window = env::var("PAWMART_CONTACT_WINDOW_SECONDS").ok();

        unsafe {
            env::set_var("PAWMART_HOST", "test.example.com");
            env::set_var("PAWMART_DATABASE", "PawMartTest");
            env::set_var("PAWMART_TRUST_PROXY", "false");
            env::set_var("PAWMART_CONTACT_WINDOW_SECONDS", "120");
        }

        let config = Config::from_env();

        assert_eq!(config.host, "test.example.com");
        assert_eq!(config.database, "PawMartTest");
        assert!(!config.trust_proxy);
        assert_eq!(config.contact_limit.window_seconds, 120);

        unsafe {
            // Restore original values
            match original_host {
                Some(val) => env::set_var("PAWMART_HOST", val),
                None => env::remove_var("PAWMART_HOST"),
            }
            match original_database {
                Some(val) => env::set_var("PAWMART_DATABASE", val),
                None => env::remove_var("PAWMART_DATABASE"),
            }
            match original_trust {
                Some(val) => env::set_var("PAWMART_TRUST_PROXY", val),
                None => env::remove_var("PAWMART_TRUST_PROXY"),
            }
            match original_window {
                Some(val) => env::set_var("PAWMART_CONTACT_WINDOW_SECONDS", val),
                None => env::remove_var("PAWMART_CONTACT_WINDOW_SECONDS"),
            }
        }
    }

    #[test]
    fn test_invalid_port_falls_back_to_default() {
        let original_port = env::var("PAWMART_PORT").ok();

        unsafe {
            env::set_var("PAWMART_PORT", "not-a-port");
        }

        let config = Config::from_env();
        assert_eq!(config.port, 3000);

        unsafe {
            match original_port {
                Some(val) => env::set_var("PAWMART_PORT", val),
                None => env::remove_var("PAWMART_PORT"),
            }
        }
    }
}
