use crate::blocker::ResourceBlocker;
use crate::chrome_finder::ChromeFinder;
use crate::config::ScrapeConfig;
use crate::launcher::ChromeLauncher;
use crate::session::SessionFactory;
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::network::ResourceType;
use chromiumoxide::cdp::browser_protocol::page::{EventDomContentEventFired, NavigateParams};
use chromiumoxide::page::Page;
use futures::StreamExt;
use harvest_core::RawPage;
use std::time::Duration;

/// Headroom added to individual CDP commands beyond the longest page deadline
const COMMAND_SLACK: Duration = Duration::from_secs(5);

/// `href` of every mailto anchor, case-insensitive on the scheme
const MAILTO_SCRIPT: &str = r#"Array.from(document.querySelectorAll('a[href^="mailto:" i]'))
    .map(a => (a.getAttribute('href') || '').trim())"#;

/// Loads a page and returns its serialized document plus mailto targets
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawPage>;
}

/// Fetches pages in a fresh headless Chrome per request
#[derive(Debug, Clone)]
pub struct ChromeScraper {
    config: ScrapeConfig,
    sessions: SessionFactory,
}

impl ChromeScraper {
    /// Locate Chrome and prepare the launcher; no browser starts until a fetch
    pub fn new(config: ScrapeConfig) -> Result<Self> {
        let chrome_path = ChromeFinder::new(config.chrome_path.clone()).find()?;
        tracing::info!("Using Chrome at {}", chrome_path.display());

        let launcher = ChromeLauncher::new(chrome_path, config.extra_args.clone());
        let command_timeout = config.page_timeout + config.listing_timeout + COMMAND_SLACK;

        Ok(Self {
            sessions: SessionFactory::new(launcher, command_timeout),
            config,
        })
    }

    pub fn config(&self) -> &ScrapeConfig {
        &self.config
    }

    /// Browser sessions open right now
    pub fn active_sessions(&self) -> usize {
        self.sessions.active_sessions()
    }

    pub(crate) fn sessions(&self) -> &SessionFactory {
        &self.sessions
    }
}

#[async_trait]
impl PageFetcher for ChromeScraper {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<RawPage> {
        tracing::info!("Fetching {}", url);

        let url = url.to_string();
        let blocked = self.config.blocked_resources.clone();

        let page = self
            .sessions
            .scoped(timeout, move |page| load_page(page, url, blocked))
            .await?;

        tracing::debug!(
            "Fetched {} bytes and {} mailto target(s)",
            page.text.len(),
            page.mailto_targets.len()
        );

        Ok(page)
    }
}

async fn load_page(page: Page, url: String, blocked: Vec<ResourceType>) -> Result<RawPage> {
    let _blocker = ResourceBlocker::install(&page, &blocked).await?;
    let mut dom_ready = page.event_listener::<EventDomContentEventFired>().await?;

    navigate(&page, &url).await?;

    if dom_ready.next().await.is_none() {
        return Err(Error::Navigation(format!(
            "{}: page closed before the document was parsed",
            url
        )));
    }

    let text = page.content().await?;
    let mailto_targets: Vec<String> = page
        .evaluate(MAILTO_SCRIPT)
        .await?
        .into_value()
        .map_err(|e| Error::Cdp(format!("Unexpected mailto script result: {}", e)))?;

    Ok(RawPage::new(text, mailto_targets))
}

/// Issue `Page.navigate` and surface Chrome's own failure text
pub(crate) async fn navigate(page: &Page, url: &str) -> Result<()> {
    let response = page.execute(NavigateParams::new(url)).await?;

    match response.result.error_text {
        Some(ref text) if !text.is_empty() => Err(classify_navigation_error(url, text)),
        _ => Ok(()),
    }
}

/// `net::` failures are connectivity problems; anything else is a navigation problem
fn classify_navigation_error(url: &str, error_text: &str) -> Error {
    if error_text.starts_with("net::") {
        Error::Network(format!("{}: {}", url, error_text))
    } else {
        Error::Navigation(format!("{}: {}", url, error_text))
    }
}
