use super::{BrowserArgs, runtime};
use anyhow::Result;
use console::style;
use harvest_browser::ChromeScraper;
use harvest_server::{ScrapeServer, ServerConfig};
use std::net::IpAddr;
use std::sync::Arc;

pub fn execute(host: IpAddr, port: u16, max_sessions: usize, browser: &BrowserArgs) -> Result<()> {
    let scrape = browser.scrape_config();
    let config = ServerConfig {
        host,
        port,
        max_sessions,
        page_timeout: scrape.page_timeout,
        listing_timeout: scrape.listing_timeout,
        ..ServerConfig::default()
    };

    runtime()?.block_on(async {
        let scraper = Arc::new(ChromeScraper::new(scrape)?);
        let addr = config.addr();
        let server = ScrapeServer::new(config, scraper.clone(), scraper);

        println!(
            "{} Scrape server listening on http://{}",
            style("✓").green().bold(),
            addr
        );
        println!("  GET  /scrape?url=<page>");
        println!("  POST /scrape-listings");
        println!();
        println!("Press Ctrl+C to stop...");

        server.run(shutdown_signal()).await?;

        println!("{} Server stopped", style("✓").green().bold());
        Ok(())
    })
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => tracing::info!("Received Ctrl+C, shutting down..."),
        Err(e) => {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}
