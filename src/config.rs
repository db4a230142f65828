use anyhow::Context;
use serde::Deserialize;
use sqlx::postgres::PgConnectOptions;

pub const DEFAULT_SECRET_KEY: &str = "change-this-secret";

/// Longest accepted session lifetime: one year.
pub const MAX_SESSION_TTL_MINUTES: i64 = 525_600;

#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
}

/// Where the relational store lives. A full `url` wins over the parts.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
    pub name: Option<String>,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database = DatabaseConfig {
            url: lookup("DATABASE_URL").filter(|v| !v.trim().is_empty()),
            host: lookup("DB_HOST").unwrap_or_else(|| "localhost".into()),
            port: match lookup("DB_PORT") {
                Some(v) => v
                    .parse::<u16>()
                    .with_context(|| format!("DB_PORT is not a port number: {v}"))?,
                None => 5432,
            },
            user: lookup("DB_USER"),
            password: lookup("DB_PASSWORD"),
            name: lookup("DB_NAME"),
            max_connections: lookup("DB_MAX_CONNECTIONS")
                .and_then(|v| v.parse::<u32>().ok())
                .unwrap_or(10),
        };

        let secret = lookup("SECRET_KEY").unwrap_or_else(|| {
            tracing::warn!("SECRET_KEY not set; using the built-in development secret");
            DEFAULT_SECRET_KEY.into()
        });
        let session = SessionConfig {
            secret,
            issuer: lookup("SESSION_ISSUER").unwrap_or_else(|| "vitalis".into()),
            audience: lookup("SESSION_AUDIENCE").unwrap_or_else(|| "vitalis-users".into()),
            ttl_minutes: match lookup("SESSION_TTL_MINUTES") {
                Some(v) => parse_ttl_minutes(&v)?,
                None => 60 * 24,
            },
        };

        Ok(Self { database, session })
    }
}

fn parse_ttl_minutes(raw: &str) -> anyhow::Result<i64> {
    let minutes = raw
        .trim()
        .parse::<i64>()
        .with_context(|| format!("SESSION_TTL_MINUTES is not a number: {raw}"))?;
    anyhow::ensure!(
        (1..=MAX_SESSION_TTL_MINUTES).contains(&minutes),
        "SESSION_TTL_MINUTES out of range (1..={MAX_SESSION_TTL_MINUTES}): {minutes}"
    );
    Ok(minutes)
}

impl DatabaseConfig {
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        if let Some(url) = &self.url {
            return url.parse::<PgConnectOptions>().context("parse DATABASE_URL");
        }

        let mut opts = PgConnectOptions::new().host(&self.host).port(self.port);
        if let Some(user) = &self.user {
            opts = opts.username(user);
        }
        if let Some(password) = &self.password {
            opts = opts.password(password);
        }
        if let Some(name) = &self.name {
            opts = opts.database(name);
        }
        Ok(opts)
    }
}
