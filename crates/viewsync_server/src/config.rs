//! Server configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for the exchange server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to.
    pub bind_addr: SocketAddr,
    /// Replica data file. `None` keeps the replica purely in memory.
    pub data_file: Option<PathBuf>,
    /// Interval between autosaves of the replica.
    pub autosave_period: Duration,
}

impl ServerConfig {
    /// Creates a new server configuration.
    pub fn new(bind_addr: SocketAddr) -> Self {
        Self {
            bind_addr,
            data_file: None,
            autosave_period: Duration::from_secs(60),
        }
    }

    /// Sets the replica data file.
    pub fn with_data_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.data_file = Some(path.into());
        self
    }

    /// Sets the autosave interval.
    pub fn with_autosave_period(mut self, period: Duration) -> Self {
        self.autosave_period = period;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(SocketAddr::from(([127, 0, 0, 1], 8181)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8181);
        assert!(config.data_file.is_none());
        assert_eq!(config.autosave_period, Duration::from_secs(60));
    }

    #[test]
    fn config_builder() {
        let config = ServerConfig::new("0.0.0.0:9000".parse().unwrap())
            .with_data_file("/tmp/replica.json")
            .with_autosave_period(Duration::from_secs(10));

        assert_eq!(config.bind_addr.port(), 9000);
        assert_eq!(config.data_file, Some(PathBuf::from("/tmp/replica.json")));
        assert_eq!(config.autosave_period, Duration::from_secs(10));
    }
}
