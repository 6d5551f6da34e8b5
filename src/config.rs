use anyhow::{Context, Result};
use chrono::{Duration, FixedOffset, NaiveTime};
use dotenvy::dotenv;
use std::env;
use std::fmt::Display;
use std::str::FromStr;

use crate::service::status::AttendancePolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,

    // Rate limiting
    pub rate_protected_per_min: u32,
    pub rate_punch_per_min: u32,

    pub api_prefix: String,

    // Attendance rules
    pub org_offset: FixedOffset,
    pub late_threshold: NaiveTime,
    pub permission_grace_minutes: i64,
    pub holiday_cache_ttl_secs: u64,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    raw.parse()
        .map_err(|e| anyhow::anyhow!("Invalid {key} value {raw:?}: {e}"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let offset_minutes: i32 = try_load("ORG_UTC_OFFSET_MINUTES", "0")?;
        let org_offset = FixedOffset::east_opt(offset_minutes * 60)
            .with_context(|| format!("ORG_UTC_OFFSET_MINUTES out of range: {offset_minutes}"))?;

        let threshold = env::var("LATE_THRESHOLD").unwrap_or_else(|_| "09:15".to_string());
        let late_threshold = NaiveTime::parse_from_str(&threshold, "%H:%M")
            .with_context(|| format!("LATE_THRESHOLD must be HH:MM, got {threshold:?}"))?;

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,

            rate_protected_per_min: try_load("RATE_PROTECTED_PER_MIN", "1000")?,
            rate_punch_per_min: try_load("RATE_PUNCH_PER_MIN", "30")?,

            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            org_offset,
            late_threshold,
            permission_grace_minutes: try_load("PERMISSION_GRACE_MINUTES", "120")?,
            holiday_cache_ttl_secs: try_load("HOLIDAY_CACHE_TTL_SECS", "3600")?,

            log_dir: env::var("LOG_DIR").unwrap_or_else(|_| "logs".to_string()),
            log_level: try_load("LOG_LEVEL", "debug")?,
        })
    }

    pub fn attendance_policy(&self) -> AttendancePolicy {
        AttendancePolicy {
            offset: self.org_offset,
            late_threshold: self.late_threshold,
            permission_grace: Duration::minutes(self.permission_grace_minutes),
        }
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        let policy = AttendancePolicy::default();
        Self {
            database_url: String::new(),
            jwt_secret: "test-secret".into(),
            server_addr: "127.0.0.1:0".into(),
            rate_protected_per_min: 1000,
            rate_punch_per_min: 30,
            api_prefix: "/api".into(),
            org_offset: policy.offset,
            late_threshold: policy.late_threshold,
            permission_grace_minutes: policy.permission_grace.num_minutes(),
            holiday_cache_ttl_secs: 60,
            log_dir: "logs".into(),
            log_level: tracing::Level::DEBUG,
        }
    }
}
