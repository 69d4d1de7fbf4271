use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::ops::RangeInclusive;

use crate::access::{Principal, Role, StaticTokenVerifier};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration, built once at start-up and handed to each component.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub access: AccessConfig,
    pub recruitment: RecruitmentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let access = match env::var("APP_ACCESS_TOKENS") {
            Ok(raw) => AccessConfig::parse(&raw)?,
            Err(_) => AccessConfig::default(),
        };

        let link_ttl_days = env::var("APP_LINK_TTL_DAYS")
            .unwrap_or_else(|_| DEFAULT_LINK_TTL_DAYS.to_string())
            .parse::<i64>()
            .ok()
            .filter(|days| LINK_TTL_DAYS_RANGE.contains(days))
            .ok_or(ConfigError::InvalidLinkTtl)?;
        let public_base_url = env::var("APP_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| format!("http://localhost:{port}"))
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            access,
            recruitment: RecruitmentConfig {
                link_ttl_days,
                public_base_url,
            },
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Bearer tokens accepted by the built-in credential verifier.
///
/// `APP_ACCESS_TOKENS` holds comma-separated `token:subject:role[:branch]` entries, for example
/// `t-admin:ops-admin:admin,t-dm:dm-bole:district_manager:Bole`.
#[derive(Debug, Clone, Default)]
pub struct AccessConfig {
    pub grants: Vec<(String, Principal)>,
}

impl AccessConfig {
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let mut grants = Vec::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let parts: Vec<&str> = entry.split(':').map(str::trim).collect();
            let (token, subject, role_name, branch) = match parts.as_slice() {
                [token, subject, role] => (*token, *subject, *role, None),
                [token, subject, role, branch] => (*token, *subject, *role, Some(*branch)),
                _ => return Err(ConfigError::InvalidAccessToken(entry.to_string())),
            };
            if token.is_empty() || subject.is_empty() {
                return Err(ConfigError::InvalidAccessToken(entry.to_string()));
            }
            let role = Role::parse(role_name, branch)
                .ok_or_else(|| ConfigError::InvalidAccessToken(entry.to_string()))?;
            grants.push((token.to_string(), Principal::new(subject, role)));
        }
        Ok(Self { grants })
    }

    pub fn verifier(&self) -> StaticTokenVerifier {
        StaticTokenVerifier::new(self.grants.iter().cloned())
    }
}

const DEFAULT_LINK_TTL_DAYS: i64 = 7;
/// Ten years at most.
pub const LINK_TTL_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

/// Application-link lifetime and the public URL links are minted against.
#[derive(Debug, Clone)]
pub struct RecruitmentConfig {
    pub link_ttl_days: i64,
    pub public_base_url: String,
}

/// Defaults match the server's default port, which is also what `AppConfig::load` derives the base
/// URL from when `APP_PUBLIC_BASE_URL` is unset.
impl Default for RecruitmentConfig {
    fn default() -> Self {
        Self {
            link_ttl_days: DEFAULT_LINK_TTL_DAYS,
            public_base_url: "http://localhost:3000".to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidAccessToken(String),
    InvalidLinkTtl,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidAccessToken(entry) => write!(
                f,
                "APP_ACCESS_TOKENS entry '{entry}' must look like token:subject:role[:branch]"
            ),
            ConfigError::InvalidLinkTtl => {
                write!(f, "APP_LINK_TTL_DAYS must be a number of days between 1 and 3650")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidAccessToken(_)
            | ConfigError::InvalidLinkTtl => None,
        }
    }
}
