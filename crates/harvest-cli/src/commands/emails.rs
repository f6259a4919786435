use super::{BrowserArgs, print_notice, runtime};
use crate::OutputFormat;
use anyhow::{Result, bail};
use console::style;
use futures::stream::{self, StreamExt};
use harvest_browser::{ChromeScraper, PageFetcher};
use harvest_core::{ContactList, Notice, RawPage};
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Options for `harvest emails`
#[derive(Debug, Clone)]
pub struct EmailsOptions {
    pub urls: Vec<String>,
    pub jobs: usize,
    pub copy_all: bool,
    pub subject: Option<String>,
    pub body: String,
}

pub fn execute(options: EmailsOptions, browser: &BrowserArgs, format: OutputFormat) -> Result<()> {
    tracing::debug!(
        "Scraping {} URL(s), {} at a time, output as {}",
        options.urls.len(),
        options.jobs,
        format.as_str()
    );

    let scraper = ChromeScraper::new(browser.scrape_config())?;
    let timeout = scraper.config().page_timeout;

    let spinner = spinner(options.urls.len());
    let fetched = runtime()?.block_on(fetch_all(
        &scraper,
        &options.urls,
        options.jobs,
        timeout,
        &spinner,
    ));
    spinner.finish_and_clear();

    let mut list = ContactList::new();
    let mut failures = 0;

    for (raw, outcome) in options.urls.iter().zip(fetched) {
        let notice = match outcome {
            Ok((source, page)) => {
                let emails = harvest_core::extract(&page.text, &page.mailto_targets);
                list.record(&source, &emails)
            }
            Err(e) => {
                failures += 1;
                Notice::error(format!("Failed to scrape {}: {}", raw, e))
            }
        };
        print_notice(&notice);
    }

    if failures == options.urls.len() {
        bail!("No page could be scraped");
    }

    match format {
        OutputFormat::Json => output_json(&list)?,
        OutputFormat::Table => output_table(&list),
        OutputFormat::Pretty => output_pretty(&list),
    }

    if options.copy_all && !list.is_empty() {
        let (joined, notice) = list.copy_all();
        println!("{}", joined);
        print_notice(&notice);
    }

    if let Some(subject) = &options.subject {
        match list.bulk_mailto(subject, &options.body) {
            Ok(link) => println!("{}", link),
            Err(e) => print_notice(&Notice::error(e.to_string())),
        }
    }

    Ok(())
}

/// Fetch every URL with at most `jobs` in flight; results keep input order
async fn fetch_all(
    fetcher: &dyn PageFetcher,
    urls: &[String],
    jobs: usize,
    timeout: Duration,
    spinner: &ProgressBar,
) -> Vec<Result<(String, RawPage)>> {
    stream::iter(urls)
        .map(|raw| async move {
            let url = harvest_server::normalize_target(raw)?;
            spinner.set_message(format!("Scraping {}", url));
            let page = fetcher.fetch(url.as_str(), timeout).await?;
            spinner.inc(1);
            Ok::<_, anyhow::Error>((url.to_string(), page))
        })
        .buffered(jobs.max(1))
        .collect()
        .await
}

fn spinner(total: usize) -> ProgressBar {
    let spinner = ProgressBar::new(total as u64);
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{pos}/{len}] {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn output_pretty(list: &ContactList) {
    println!("\n{}", style("Contacts").bold().cyan());
    println!("{}", style("========").cyan());

    if list.is_empty() {
        println!("  {}", style("No emails collected").yellow());
    }

    for entry in list.entries() {
        if let Some(email) = &entry.email {
            println!("  {}  {}", style(email).green(), style(&entry.source).dim());
        }
    }

    println!();
}

fn output_json(list: &ContactList) -> Result<()> {
    let json = serde_json::to_string_pretty(list)?;
    println!("{}", json);
    Ok(())
}

fn output_table(list: &ContactList) {
    println!("Email,Source");
    for entry in list.entries() {
        if let Some(email) = &entry.email {
            println!("{},{}", email, entry.source);
        }
    }
}
