//! Server configuration, read from `MKT_*` environment variables.
//!
//! Missing values fall back to defaults quietly. Values that are present but invalid are reported at `WARN` and then
//! fall back too, so a typo never stops the server from starting with a sane setup.
use std::{env, fmt::Display, str::FromStr};

use log::*;
use mkt_common::{helpers::parse_boolean_flag, CommissionRate};

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8480;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
const DEFAULT_COMMISSION_BPS: u32 = 1_000;
const DEFAULT_EVENT_BUFFER_SIZE: usize = 100;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub db_max_connections: u32,
    /// The platform's share of each seller's subtotal on a completed order
    pub commission_rate: CommissionRate,
    /// Capacity of each event hook's queue. Producers wait when it is full.
    pub event_buffer_size: usize,
    /// Apply the embedded migrations at start-up
    pub run_migrations: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            db_max_connections: DEFAULT_DB_MAX_CONNECTIONS,
            commission_rate: default_commission_rate(),
            event_buffer_size: DEFAULT_EVENT_BUFFER_SIZE,
            run_migrations: true,
        }
    }
}

fn default_commission_rate() -> CommissionRate {
    CommissionRate::from_basis_points(DEFAULT_COMMISSION_BPS).unwrap_or_default()
}

/// Reads and parses `name`, falling back to `default` if it is unset or invalid.
fn env_or<T>(name: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(name) {
        Ok(s) => s.parse::<T>().unwrap_or_else(|e| {
            warn!("🪛️ {s} is not a valid value for {name}. {e} Using the default, {default}, instead.");
            default
        }),
        Err(_) => {
            debug!("🪛️ {name} is not set. Using the default, {default}.");
            default
        },
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env_or("MKT_PORT", DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let db_max_connections = env_or("MKT_DB_MAX_CONNECTIONS", DEFAULT_DB_MAX_CONNECTIONS).max(1);
        let commission_rate = env_or("MKT_COMMISSION_RATE", default_commission_rate());
        info!("🪛️ Platform commission rate is {commission_rate}");
        let event_buffer_size = env_or("MKT_EVENT_BUFFER_SIZE", DEFAULT_EVENT_BUFFER_SIZE).max(1);
        let run_migrations = parse_boolean_flag(env::var("MKT_RUN_MIGRATIONS").ok(), true);
        Self { host, port, database_url, db_max_connections, commission_rate, event_buffer_size, run_migrations }
    }
}
