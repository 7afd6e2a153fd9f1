use std::env;
use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::PgConnectOptions;

use crate::error::PollError;

/**
 * Where the votes table lives and how to reach it
 */
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
    /**
     * A full connection string, takes precedence over the individual fields
     */
    pub url: Option<String>,
    pub max_connections: u32,
    pub connect_timeout: Duration,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub listen_addr: String,
    pub db: DbConfig,
}

fn parse<T: FromStr>(name: &'static str, raw: Option<String>, default: T) -> Result<T, PollError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value.trim().parse::<T>().map_err(|err| PollError::Config {
            name,
            reason: format!("{:?}: {}", value, err),
        }),
    }
}

impl Config {
    /**
     * Read configuration from the process environment. `main` loads `.env`
     * before calling this.
     */
    pub fn from_env() -> Result<Self, PollError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, PollError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let text = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let db = DbConfig {
            host: text("DB_HOST", "localhost"),
            port: parse("DB_PORT", lookup("DB_PORT"), 5432)?,
            dbname: text("DB_NAME", "poll_db"),
            user: text("DB_USER", "poll_user"),
            password: text("DB_PASSWORD", "poll_password"),
            url: lookup("DATABASE_URL").filter(|url| !url.is_empty()),
            max_connections: parse("DB_MAX_CONNECTIONS", lookup("DB_MAX_CONNECTIONS"), 5)?,
            connect_timeout: Duration::from_secs(parse(
                "DB_CONNECT_TIMEOUT_SECS",
                lookup("DB_CONNECT_TIMEOUT_SECS"),
                5,
            )?),
        };

        Ok(Config {
            listen_addr: text("LISTEN_ADDR", "0.0.0.0:5000"),
            db,
        })
    }
}

impl DbConfig {
    pub fn connect_options(&self) -> Result<PgConnectOptions, PollError> {
        if let Some(url) = &self.url {
            return PgConnectOptions::from_str(url).map_err(|err| PollError::Config {
                name: "DATABASE_URL",
                reason: err.to_string(),
            });
        }

        Ok(PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .database(&self.dbname)
            .username(&self.user)
            .password(&self.password))
    }

    /**
     * Human readable target for logs, without the password
     */
    pub fn describe(&self) -> String {
        match &self.url {
            Some(_) => "DATABASE_URL".to_string(),
            None => format!("{}@{}:{}/{}", self.user, self.host, self.port, self.dbname),
        }
    }
}
