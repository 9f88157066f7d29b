use std::{env, net::IpAddr, path::PathBuf};
use tracing::warn;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_DATA_PATH: &str = "data/budget.json";

/// Server settings, read once from the environment at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub port: u16,
    pub data_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unparsable values fall back to
    /// their defaults with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let port = match lookup("PORT") {
            Some(value) => value.trim().parse::<u16>().unwrap_or_else(|_| {
                warn!(value = %value, "invalid PORT, using {DEFAULT_PORT}");
                DEFAULT_PORT
            }),
            None => DEFAULT_PORT,
        };

        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value.trim().parse::<IpAddr>().unwrap_or_else(|_| {
                warn!(value = %value, "invalid BIND_ADDR, listening on all interfaces");
                IpAddr::from([0, 0, 0, 0])
            }),
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let data_path = lookup("APP_DATA_PATH")
            .filter(|path| !path.trim().is_empty())
            .map_or_else(|| PathBuf::from(DEFAULT_DATA_PATH), PathBuf::from);

        Self {
            bind_addr,
            port,
            data_path,
        }
    }
}
