use anyhow::Result;
use clap::Args;
use console::style;
use harvest_browser::ScrapeConfig;
use harvest_core::{Notice, NoticeLevel};
use std::path::PathBuf;
use std::time::Duration;

pub mod completion;
pub mod emails;
pub mod listings;
pub mod serve;

/// Browser settings shared by every command that drives Chrome
#[derive(Args, Debug, Clone)]
pub struct BrowserArgs {
    /// Path to Chrome/Chromium binary (auto-detected if not specified)
    #[arg(long, env = "CHROME_PATH", value_name = "PATH")]
    pub chrome_path: Option<PathBuf>,

    /// Maximum time to load a page, in milliseconds
    #[arg(long, env = "HARVEST_PAGE_TIMEOUT_MS", default_value_t = 20_000, value_name = "MS")]
    pub page_timeout_ms: u64,

    /// Maximum time to wait for listing results, in milliseconds
    #[arg(long, env = "HARVEST_LISTING_TIMEOUT_MS", default_value_t = 5_000, value_name = "MS")]
    pub listing_timeout_ms: u64,
}

impl BrowserArgs {
    pub fn scrape_config(&self) -> ScrapeConfig {
        ScrapeConfig::default()
            .with_chrome_path(self.chrome_path.clone())
            .with_page_timeout(Duration::from_millis(self.page_timeout_ms))
            .with_listing_timeout(Duration::from_millis(self.listing_timeout_ms))
    }
}

/// Multi-threaded runtime for commands that drive the browser
fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

/// Render a notice on stderr
fn print_notice(notice: &Notice) {
    match notice.level {
        NoticeLevel::Success => eprintln!("{} {}", style("✓").green().bold(), notice.message),
        NoticeLevel::Error => eprintln!("{} {}", style("✗").red().bold(), notice.message),
    }
}
