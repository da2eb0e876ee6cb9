use secrecy::Secret;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;
use std::time::Duration;

pub const DEFAULT_MONGODB_URI: &str = "mongodb://mongodb:27017/linkgate";
pub const DEFAULT_DATABASE: &str = "linkgate";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone)]
pub struct PostServiceConfig {
    pub common: core_config::Config,
    pub mongodb: MongoConfig,
}

#[derive(Debug, Clone)]
pub struct MongoConfig {
    /// Connection string. Its path names the database, falling back to
    /// [`DEFAULT_DATABASE`] when absent.
    pub uri: Secret<String>,
    /// Upper bound for establishing the session at startup.
    pub connect_timeout: Duration,
    /// Upper bound for each individual store operation.
    pub operation_timeout: Duration,
}

impl PostServiceConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;

        let uri = env::var("MONGODB_URI").unwrap_or_else(|_| DEFAULT_MONGODB_URI.to_string());

        Ok(PostServiceConfig {
            common,
            mongodb: MongoConfig {
                uri: Secret::new(uri),
                connect_timeout: get_secs("MONGODB_CONNECT_TIMEOUT_SECS")?,
                operation_timeout: get_secs("MONGODB_OPERATION_TIMEOUT_SECS")?,
            },
        })
    }
}

fn get_secs(key: &str) -> Result<Duration, AppError> {
    match env::var(key) {
        Ok(val) => val
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or_else(|| {
                AppError::ConfigError(anyhow::anyhow!(
                    "{} must be a positive number of seconds, got '{}'",
                    key,
                    val
                ))
            }),
        Err(_) => Ok(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
    }
}
