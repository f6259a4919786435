use super::{BrowserArgs, runtime};
use crate::OutputFormat;
use anyhow::Result;
use console::style;
use harvest_browser::{ChromeScraper, ListingSource};
use harvest_core::{Listing, ListingQuery};
use indicatif::ProgressBar;
use std::time::Duration;

pub fn execute(query: &str, location: &str, browser: &BrowserArgs, format: OutputFormat) -> Result<()> {
    let query = ListingQuery::new(query, location)?;
    let scraper = ChromeScraper::new(browser.scrape_config())?;
    let timeout = scraper.config().listing_timeout;

    let spinner = ProgressBar::new_spinner();
    spinner.set_message(format!("Searching for {}", query.search_terms()));
    spinner.enable_steady_tick(Duration::from_millis(100));

    let results = runtime()?.block_on(scraper.search(&query, timeout));
    spinner.finish_and_clear();
    let listings = results?;

    match format {
        OutputFormat::Json => output_json(&listings)?,
        OutputFormat::Table => output_table(&listings),
        OutputFormat::Pretty => output_pretty(&query, &listings),
    }

    Ok(())
}

fn output_pretty(query: &ListingQuery, listings: &[Listing]) {
    println!(
        "\n{}",
        style(format!("Listings for \"{}\"", query.search_terms())).bold().cyan()
    );

    if listings.is_empty() {
        println!("  {}", style("No listings found").yellow());
    }

    for (i, listing) in listings.iter().enumerate() {
        println!(
            "\n  {}. {}",
            i + 1,
            style(listing.title.as_deref().unwrap_or("(untitled)")).bold()
        );
        if let Some(address) = &listing.address {
            println!("     {}", address);
        }
        if let Some(website) = &listing.website {
            println!("     {}", style(website).green());
        }
        if let Some(link) = &listing.link {
            println!("     {}", style(link).dim());
        }
    }

    println!();
}

fn output_json(listings: &[Listing]) -> Result<()> {
    let json = serde_json::to_string_pretty(listings)?;
    println!("{}", json);
    Ok(())
}

fn output_table(listings: &[Listing]) {
    println!("Title,Address,Website,Link");
    for listing in listings {
        println!(
            "{},{},{},{}",
            csv_field(listing.title.as_deref()),
            csv_field(listing.address.as_deref()),
            csv_field(listing.website.as_deref()),
            csv_field(listing.link.as_deref())
        );
    }
}

/// Quote a value when it would break the row
fn csv_field(value: Option<&str>) -> String {
    match value {
        Some(v) if v.contains([',', '"', '\n']) => format!("\"{}\"", v.replace('"', "\"\"")),
        Some(v) => v.to_string(),
        None => String::new(),
    }
}
