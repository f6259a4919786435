use crate::fetcher::{ChromeScraper, navigate};
use crate::{Error, Result};
use async_trait::async_trait;
use chromiumoxide::page::Page;
use harvest_core::{Listing, ListingQuery};
use std::time::{Duration, Instant};
use url::Url;

const SEARCH_BASE: &str = "https://www.google.com/maps/search/";

/// One result card in the listing feed
const CARD_SELECTOR: &str = ".Nv2PK";

const LISTING_SCRIPT: &str = r#"Array.from(document.querySelectorAll('.Nv2PK')).map(card => {
    const text = el => (el && el.textContent ? el.textContent.trim() : null);
    const href = el => (el && el.href ? el.href : null);
    return {
        title: text(card.querySelector('.qBF1Pd')),
        link: href(card.querySelector('a.hfpxzc')),
        address: Array.from(card.querySelectorAll('.W4Efsd:first-child > span:first-child'))
            .map(span => (span.textContent || '').trim())
            .join(' '),
        website: href(card.querySelector('a.lcr4fd.S9kvJb')),
    };
})"#;

const POLL_START: Duration = Duration::from_millis(100);
const POLL_MAX: Duration = Duration::from_secs(1);

/// Searches a map service for business listings
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// `timeout` bounds the wait for results once the search page is open
    async fn search(&self, query: &ListingQuery, timeout: Duration) -> Result<Vec<Listing>>;
}

/// Search page URL for `query`
pub fn search_url(query: &ListingQuery) -> Result<Url> {
    let mut url = Url::parse(SEARCH_BASE)
        .map_err(|e| Error::Navigation(format!("Invalid search base: {}", e)))?;

    url.path_segments_mut()
        .map_err(|_| Error::Navigation("Search base cannot carry a path".to_string()))?
        .pop_if_empty()
        .push(&query.search_terms());

    Ok(url)
}

#[async_trait]
impl ListingSource for ChromeScraper {
    async fn search(&self, query: &ListingQuery, timeout: Duration) -> Result<Vec<Listing>> {
        let url = search_url(query)?;
        tracing::info!("Searching listings for '{}'", query.search_terms());

        let deadline = self.config().page_timeout + timeout;
        let listings = self
            .sessions()
            .scoped(deadline, move |page| scrape_listings(page, url, timeout))
            .await?;

        tracing::info!("Found {} listing(s)", listings.len());
        Ok(listings)
    }
}

async fn scrape_listings(page: Page, url: Url, timeout: Duration) -> Result<Vec<Listing>> {
    navigate(&page, url.as_str()).await?;
    wait_for_selector(&page, CARD_SELECTOR, timeout).await?;

    let listings: Vec<Listing> = page
        .evaluate(LISTING_SCRIPT)
        .await?
        .into_value()
        .map_err(|e| Error::Cdp(format!("Unexpected listing script result: {}", e)))?;

    Ok(listings.into_iter().map(Listing::normalized).collect())
}

/// Poll for `selector` with exponential backoff until `timeout` expires
async fn wait_for_selector(page: &Page, selector: &str, timeout: Duration) -> Result<()> {
    let start = Instant::now();
    let mut interval = POLL_START;

    loop {
        if page.find_element(selector).await.is_ok() {
            return Ok(());
        }

        let elapsed = start.elapsed();
        if elapsed >= timeout {
            tracing::debug!("Selector '{}' never appeared", selector);
            return Err(Error::ResultsTimeout(timeout));
        }

        tokio::time::sleep(next_poll(interval, timeout - elapsed)).await;
        interval = (interval * 2).min(POLL_MAX);
    }
}

fn next_poll(interval: Duration, remaining: Duration) -> Duration {
    interval.min(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_url_joins_query_and_location() {
        let query = ListingQuery::new("coffee", "Austin TX").unwrap();
        assert_eq!(
            search_url(&query).unwrap().as_str(),
            "https://www.google.com/maps/search/coffee%20Austin%20TX"
        );
    }

    #[test]
    fn test_search_url_without_location() {
        let query = ListingQuery::new("plumber", "").unwrap();
        assert_eq!(
            search_url(&query).unwrap().as_str(),
            "https://www.google.com/maps/search/plumber"
        );
    }

    #[test]
    fn test_search_url_escapes_path_separators() {
        let query = ListingQuery::new("24/7 locksmith", "").unwrap();
        let url = search_url(&query).unwrap();
        assert_eq!(url.path(), "/maps/search/24%2F7%20locksmith");
    }

    #[test]
    fn test_next_poll_never_overshoots() {
        assert_eq!(
            next_poll(Duration::from_millis(800), Duration::from_millis(300)),
            Duration::from_millis(300)
        );
        assert_eq!(
            next_poll(Duration::from_millis(100), Duration::from_secs(5)),
            Duration::from_millis(100)
        );
    }

    #[test]
    fn test_listing_script_reads_every_field() {
        for field in ["title:", "link:", "address:", "website:"] {
            assert!(LISTING_SCRIPT.contains(field));
        }
    }
}
