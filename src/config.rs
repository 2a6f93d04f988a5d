use anyhow::Context;
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::info;

pub const DEFAULT_REGISTRATION_OFFSET_DAYS: i64 = 30;
pub const MAX_REGISTRATION_OFFSET_DAYS: i64 = 365;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

#[derive(Clone, Debug)]
pub struct BootstrapAdmin {
    pub email: String,
    pub password: String,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub rust_log: String,
    pub bind_addr: String,
    pub storage_dir: PathBuf,
    pub session_secure: bool,
    /// Days before the national assembly when registration closes.
    pub registration_offset_days: i64,
    pub max_upload_bytes: usize,
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        // A missing .env is fine in deployed environments.
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e).context("failed to read .env");
            }
        }

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "debug".into());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
        let storage_dir = env::var("STORAGE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("storage"));

        let bootstrap_admin = match (
            env::var("BOOTSTRAP_ADMIN_EMAIL"),
            env::var("BOOTSTRAP_ADMIN_PASSWORD"),
        ) {
            (Ok(email), Ok(password)) => Some(BootstrapAdmin { email, password }),
            _ => None,
        };

        Ok(Self {
            database_url,
            rust_log,
            bind_addr,
            storage_dir,
            session_secure: parse_or("SESSION_SECURE", false)?,
            registration_offset_days: checked_offset(parse_or(
                "REGISTRATION_OFFSET_DAYS",
                DEFAULT_REGISTRATION_OFFSET_DAYS,
            )?)?,
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", DEFAULT_MAX_UPLOAD_BYTES)?,
            bootstrap_admin,
        })
    }
}

/// The deadline must fall before the assembly and within a year of it.
fn checked_offset(days: i64) -> anyhow::Result<i64> {
    anyhow::ensure!(
        (0..=MAX_REGISTRATION_OFFSET_DAYS).contains(&days),
        "REGISTRATION_OFFSET_DAYS must be between 0 and {MAX_REGISTRATION_OFFSET_DAYS}, got {days}"
    );
    Ok(days)
}

fn parse_or<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr + Display,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("invalid value for {key}: {raw}")),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            Ok(default)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_or_falls_back_when_unset() {
        let value: i64 = parse_or("ASSEMBLEIA_TEST_UNSET_KEY", 30).unwrap();
        assert_eq!(value, 30);
    }

    #[test]
    fn offset_must_stay_within_a_year() {
        assert_eq!(checked_offset(30).unwrap(), 30);
        assert_eq!(checked_offset(0).unwrap(), 0);
        assert_eq!(checked_offset(365).unwrap(), 365);
        assert!(checked_offset(-1).is_err());
        assert!(checked_offset(366).is_err());
        assert!(checked_offset(i64::MAX).is_err());
    }
}
