use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub gateway: GatewayConfig,
    /// Absent means mock-email mode.
    pub smtp: Option<SmtpSettings>,
    /// Ordered instructor roster; empty falls back to the built-in default.
    #[serde(default)]
    pub instructors: Vec<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub jwt_expiration_seconds: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Gateway protocol family: "v1" (legacy transrec) or "v2" (ePay).
    #[serde(default = "default_gateway_version")]
    pub version: String,
    pub merchant_code: String,
    pub secret: String,
    pub base_url: String,
    pub success_url: String,
    pub failure_url: String,
}

fn default_gateway_version() -> String {
    "v2".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct SmtpSettings {
    pub host: String,
    #[serde(default = "default_smtp_port")]
    pub port: u16,
    pub from_address: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn default_smtp_port() -> u16 {
    587
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            // Start off by merging in the "default" configuration file
            .add_source(config::File::with_name("config/default"))
            // Environment-specific file, optional
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Local overrides, not checked in
            .add_source(config::File::with_name("config/local").required(false))
            // Eg. `SATTVA__SERVER__PORT=9000` overrides `server.port`
            .add_source(config::Environment::with_prefix("SATTVA").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
