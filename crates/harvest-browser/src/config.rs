use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use std::path::PathBuf;
use std::time::Duration;

/// Bounded wait for a general page load
pub const DEFAULT_PAGE_TIMEOUT: Duration = Duration::from_millis(20_000);

/// Bounded wait for listing cards to render
pub const DEFAULT_LISTING_TIMEOUT: Duration = Duration::from_millis(5_000);

/// Settings shared by every browser session the scraper opens
#[derive(Debug, Clone)]
pub struct ScrapeConfig {
    /// Explicit Chrome binary; discovered when `None`
    pub chrome_path: Option<PathBuf>,
    pub page_timeout: Duration,
    pub listing_timeout: Duration,
    /// Resource types failed with `BlockedByClient` during page fetches
    pub blocked_resources: Vec<ResourceType>,
    /// Additional Chrome command-line switches
    pub extra_args: Vec<String>,
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            chrome_path: None,
            page_timeout: DEFAULT_PAGE_TIMEOUT,
            listing_timeout: DEFAULT_LISTING_TIMEOUT,
            blocked_resources: vec![
                ResourceType::Image,
                ResourceType::Stylesheet,
                ResourceType::Font,
                ResourceType::Media,
            ],
            extra_args: Vec::new(),
        }
    }
}

impl ScrapeConfig {
    pub fn with_chrome_path(mut self, path: Option<PathBuf>) -> Self {
        self.chrome_path = path;
        self
    }

    pub fn with_page_timeout(mut self, timeout: Duration) -> Self {
        self.page_timeout = timeout;
        self
    }

    pub fn with_listing_timeout(mut self, timeout: Duration) -> Self {
        self.listing_timeout = timeout;
        self
    }
}
