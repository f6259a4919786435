use harvest_browser::{DEFAULT_LISTING_TIMEOUT, DEFAULT_PAGE_TIMEOUT};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_SESSIONS: usize = 4;
pub const DEFAULT_SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Listener and request-handling settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Browser sessions allowed to run at once across all requests
    pub max_sessions: usize,
    pub page_timeout: Duration,
    pub listing_timeout: Duration,
    /// How long open connections may finish after shutdown is requested
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: DEFAULT_PORT,
            max_sessions: DEFAULT_MAX_SESSIONS,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
            shutdown_grace: DEFAULT_SHUTDOWN_GRACE,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
