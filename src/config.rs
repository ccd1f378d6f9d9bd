use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use crate::storage::postgres::DEFAULT_FETCH_LIMIT;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    File,
    Postgres,
}

impl FromStr for Backend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "file" | "json" => Ok(Self::File),
            "postgres" | "postgresql" | "pg" => Ok(Self::Postgres),
            other => anyhow::bail!("Unknown ANNOUNCEMENTS_BACKEND: {other} (expected file or postgres)"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub backend: Backend,
    pub data_file: PathBuf,
    pub database_url: String,
    pub pool_min: u32,
    pub pool_max: u32,
    pub fetch_limit: i64,
    pub run_migrations: bool,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.into());

        let pool_min: u32 = parse(&get, "PGPOOL_MIN", 1)?;
        let pool_max: u32 = parse(&get, "PGPOOL_MAX", 10)?;
        if pool_max == 0 || pool_min > pool_max {
            anyhow::bail!("Invalid pool bounds: PGPOOL_MIN={pool_min} PGPOOL_MAX={pool_max}");
        }

        let fetch_limit: i64 = parse(&get, "ANNOUNCEMENTS_FETCH_LIMIT", DEFAULT_FETCH_LIMIT)?;
        if fetch_limit <= 0 {
            anyhow::bail!("ANNOUNCEMENTS_FETCH_LIMIT must be positive");
        }

        Ok(Self {
            backend: or("ANNOUNCEMENTS_BACKEND", "file").parse()?,
            data_file: PathBuf::from(or("ANNOUNCEMENTS_JSON", "resources/announcements.json")),
            database_url: database_url(&get),
            pool_min,
            pool_max,
            fetch_limit,
            run_migrations: parse_bool(&or("RUN_MIGRATIONS", "true"))?,
            host: or("HOST", "0.0.0.0"),
            port: parse(&get, "PORT", 5000)?,
        })
    }
}

/// `DATABASE_URL`, then `POSTGRES_DSN`, then a URL assembled from the
/// discrete `PG*` variables.
fn database_url(get: &impl Fn(&str) -> Option<String>) -> String {
    if let Some(dsn) = get("DATABASE_URL").or_else(|| get("POSTGRES_DSN")) {
        return dsn;
    }
    let host = get("PGHOST").unwrap_or_else(|| "localhost".into());
    let port = get("PGPORT").unwrap_or_else(|| "5432".into());
    let db = get("PGDATABASE").unwrap_or_else(|| "postgres".into());
    let user = get("PGUSER").unwrap_or_else(|| "postgres".into());
    let password = get("PGPASSWORD").unwrap_or_else(|| "postgres".into());
    format!("postgresql://{user}:{password}@{host}:{port}/{db}")
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match get(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid value for {key}: {raw:?} ({e})")),
        None => Ok(default),
    }
}

fn parse_bool(raw: &str) -> anyhow::Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("Invalid boolean: {other}"),
    }
}
