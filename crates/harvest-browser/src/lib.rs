//! Headless Chrome page fetching
//!
//! Every request gets an isolated browser process that is torn down before
//! the request returns.

mod blocker;
mod chrome_finder;
mod config;
mod error;
mod fetcher;
mod launcher;
mod listings;
mod profile;
mod session;

pub use blocker::ResourceBlocker;
pub use chrome_finder::ChromeFinder;
pub use config::{DEFAULT_LISTING_TIMEOUT, DEFAULT_PAGE_TIMEOUT, ScrapeConfig};
pub use error::{Error, Result};
pub use fetcher::{ChromeScraper, PageFetcher};
pub use launcher::ChromeLauncher;
pub use listings::{ListingSource, search_url};
pub use profile::ScratchProfile;
pub use session::{BrowserSession, SessionFactory, SessionLease, SessionTracker};

pub use chromiumoxide::cdp::browser_protocol::network::ResourceType;
