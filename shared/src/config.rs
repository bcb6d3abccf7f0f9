//! Configuration management for Lambda functions.

use std::env;

use chrono_tz::Tz;

use crate::{Error, Result};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database host
    pub db_host: Option<String>,
    /// Database name
    pub db_name: String,
    /// ARN of the secret containing database credentials
    pub db_secret_arn: Option<String>,
    /// Direct connection string; skips Secrets Manager when set
    pub database_url: Option<String>,
    /// Shared secret expected by the admin API
    pub admin_password: Option<String>,
    /// Timezone used when a request does not specify one
    pub calendar_timezone: Tz,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Either `DATABASE_URL` or the `DB_HOST`/`DB_SECRET_ARN` pair must be
    /// present; everything else has a default or is optional.
    pub fn from_env() -> Result<Self> {
        let database_url = env::var("DATABASE_URL").ok();
        let db_host = env::var("DB_HOST").ok();
        let db_secret_arn = env::var("DB_SECRET_ARN").ok();

        if database_url.is_none() {
            if db_host.is_none() {
                return Err(Error::Config("DB_HOST not set".to_string()));
            }
            if db_secret_arn.is_none() {
                return Err(Error::Config("DB_SECRET_ARN not set".to_string()));
            }
        }

        let calendar_timezone = match env::var("CALENDAR_TIMEZONE") {
            Ok(name) => name
                .parse()
                .map_err(|_| Error::Config(format!("Invalid CALENDAR_TIMEZONE: {}", name)))?,
            Err(_) => chrono_tz::America::Los_Angeles,
        };

        Ok(Self {
            db_host,
            db_name: env::var("DB_NAME").unwrap_or_else(|_| "campuscal".to_string()),
            db_secret_arn,
            database_url,
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            calendar_timezone,
        })
    }
}
