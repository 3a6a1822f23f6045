//! Configuration module
//!
//! Server configuration is read from environment variables (optionally via a
//! `.env` file). Parsing goes through `Config::from_lookup` so it can be
//! exercised without touching the process environment.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::constants::{DEFAULT_UPLOAD_ROUTE, MAX_UPLOAD_SIZE_BYTES};

const DEFAULT_PORT: u16 = 4000;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_UPLOAD_DIR: &str = "../../data/uploads";
const DEFAULT_HTTP_CONCURRENCY_LIMIT: usize = 10_000;

/// What to do when the committed file name already exists in the upload directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CollisionPolicy {
    /// Keep the existing file and store the new one as `name (1).ext`, `name (2).ext`, ...
    #[default]
    Suffix,
    /// Atomically replace the existing file.
    Overwrite,
}

impl FromStr for CollisionPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "suffix" | "rename" => Ok(CollisionPolicy::Suffix),
            "overwrite" | "replace" => Ok(CollisionPolicy::Overwrite),
            _ => Err(anyhow::anyhow!("Invalid collision policy: {}", s)),
        }
    }
}

impl Display for CollisionPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            CollisionPolicy::Suffix => write!(f, "suffix"),
            CollisionPolicy::Overwrite => write!(f, "overwrite"),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err(anyhow::anyhow!("Invalid log format: {}", s)),
        }
    }
}

/// Ingestion server configuration.
#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub server_port: u16,
    pub environment: String,
    pub cors_origins: Vec<String>,
    /// Absolute path of the upload directory.
    pub upload_dir: PathBuf,
    pub upload_route: String,
    pub max_upload_size_bytes: u64,
    pub verify_file_signature: bool,
    pub collision_policy: CollisionPolicy,
    pub log_format: LogFormat,
    pub http_concurrency_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let cwd = env::current_dir()
            .map_err(|e| anyhow::anyhow!("Failed to resolve working directory: {}", e))?;
        Self::from_lookup(|key| env::var(key).ok(), &cwd)
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// Relative `UPLOAD_DIR` values are resolved against `base_dir`.
    pub fn from_lookup<F>(lookup: F, base_dir: &Path) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("ENVIRONMENT")
            .or_else(|| lookup("APP_ENV"))
            .unwrap_or_else(|| "development".to_string());

        let cors_origins_str = lookup("CORS_ORIGINS").unwrap_or_else(|| "*".to_string());
        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let server_port = match lookup("PORT") {
            Some(port) => port
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            None => DEFAULT_PORT,
        };

        let upload_dir_raw = lookup("UPLOAD_DIR").unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_string());
        let upload_dir = resolve_upload_dir(base_dir, &upload_dir_raw);

        let max_upload_size_bytes = match lookup("MAX_UPLOAD_SIZE_MB") {
            Some(mb) => {
                let mb = mb
                    .trim()
                    .parse::<u64>()
                    .map_err(|_| anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be a whole number"))?;
                mb.checked_mul(1024 * 1024).ok_or_else(|| {
                    anyhow::anyhow!("MAX_UPLOAD_SIZE_MB is too large: {} MB", mb)
                })?
            }
            None => MAX_UPLOAD_SIZE_BYTES,
        };

        let verify_file_signature = lookup("VERIFY_FILE_SIGNATURE")
            .map(|v| v.trim().eq_ignore_ascii_case("true") || v.trim() == "1")
            .unwrap_or(true);

        let collision_policy = match lookup("UPLOAD_COLLISION_POLICY") {
            Some(policy) => policy.parse()?,
            None => CollisionPolicy::default(),
        };

        let log_format = match lookup("LOG_FORMAT") {
            Some(format) => format.parse()?,
            None => LogFormat::default(),
        };

        let http_concurrency_limit = lookup("HTTP_CONCURRENCY_LIMIT")
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(DEFAULT_HTTP_CONCURRENCY_LIMIT)
            .max(1);

        let config = Config {
            host: lookup("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string()),
            server_port,
            environment,
            cors_origins,
            upload_dir,
            upload_route: lookup("UPLOAD_ROUTE").unwrap_or_else(|| DEFAULT_UPLOAD_ROUTE.to_string()),
            max_upload_size_bytes,
            verify_file_signature,
            collision_policy,
            log_format,
            http_concurrency_limit,
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.is_production() && self.cors_origins.iter().any(|o| o == "*") {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        if !self.upload_route.starts_with('/') {
            return Err(anyhow::anyhow!("UPLOAD_ROUTE must start with '/'"));
        }

        if self.max_upload_size_bytes == 0 {
            return Err(anyhow::anyhow!("MAX_UPLOAD_SIZE_MB must be greater than zero"));
        }

        Ok(())
    }

    /// Check if the application is running in production mode
    pub fn is_production(&self) -> bool {
        let env = self.environment.to_lowercase();
        env == "production" || env == "prod"
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.server_port)
    }
}

fn resolve_upload_dir(base_dir: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw.trim());
    let joined = if path.is_absolute() {
        path
    } else {
        base_dir.join(path)
    };
    normalize_lexically(&joined)
}

/// Collapse `.` and `..` components without touching the filesystem
/// (the directory may not exist yet).
fn normalize_lexically(path: &Path) -> PathBuf {
    use std::path::Component;

    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}
