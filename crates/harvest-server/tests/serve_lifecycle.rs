use async_trait::async_trait;
use harvest_browser::{ListingSource, PageFetcher};
use harvest_core::{Listing, ListingQuery, RawPage};
use harvest_server::{ScrapeServer, ServerConfig};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;

struct ContactPage;

#[async_trait]
impl PageFetcher for ContactPage {
    async fn fetch(&self, _url: &str, _timeout: Duration) -> harvest_browser::Result<RawPage> {
        Ok(RawPage::new("<p>hello@studio.design</p>", Vec::new()))
    }
}

#[async_trait]
impl ListingSource for ContactPage {
    async fn search(
        &self,
        _query: &ListingQuery,
        _timeout: Duration,
    ) -> harvest_browser::Result<Vec<Listing>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_serves_requests_until_shutdown() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let config = ServerConfig {
        shutdown_grace: Duration::from_millis(200),
        ..ServerConfig::default()
    };
    let source = Arc::new(ContactPage);
    let server = ScrapeServer::new(config, source.clone(), source);

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let running = tokio::spawn(server.serve(listener, async move {
        let _ = stop_rx.await;
    }));

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(
            b"GET /scrape?url=studio.design HTTP/1.1\r\nHost: localhost\r\nConnection: close\r\n\r\n",
        )
        .await
        .unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200 OK"));
    assert!(response.contains("application/json"));
    assert!(response.ends_with(r#"{"emails":["hello@studio.design"]}"#));

    stop_tx.send(()).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), running)
        .await
        .unwrap()
        .unwrap();
    assert!(stopped.is_ok());

    assert!(TcpStream::connect(addr).await.is_err());
}
