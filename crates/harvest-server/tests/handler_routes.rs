use async_trait::async_trait;
use harvest_browser::{Error as BrowserError, ListingSource, PageFetcher};
use harvest_core::{Listing, ListingQuery, RawPage};
use harvest_server::{AppState, HttpResponse, ServerConfig, handle};
use http::{Method, Request, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::Bytes;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Serves a canned page, or fails with a network error
struct FakeFetcher {
    page: Option<RawPage>,
    requested: Mutex<Vec<String>>,
}

impl FakeFetcher {
    fn serving(text: &str, mailto: &[&str]) -> Self {
        Self {
            page: Some(RawPage::new(
                text,
                mailto.iter().map(|m| m.to_string()).collect(),
            )),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn failing() -> Self {
        Self {
            page: None,
            requested: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl PageFetcher for FakeFetcher {
    async fn fetch(&self, url: &str, _timeout: Duration) -> harvest_browser::Result<RawPage> {
        self.requested.lock().unwrap().push(url.to_string());
        self.page
            .clone()
            .ok_or_else(|| BrowserError::Network("net::ERR_CONNECTION_REFUSED at 10.0.0.9".into()))
    }
}

struct FakeListings {
    results: Option<Vec<Listing>>,
}

#[async_trait]
impl ListingSource for FakeListings {
    async fn search(
        &self,
        _query: &ListingQuery,
        timeout: Duration,
    ) -> harvest_browser::Result<Vec<Listing>> {
        self.results.clone().ok_or(BrowserError::ResultsTimeout(timeout))
    }
}

fn state(fetcher: FakeFetcher, listings: FakeListings) -> Arc<AppState> {
    Arc::new(AppState::new(
        Arc::new(fetcher),
        Arc::new(listings),
        &ServerConfig::default(),
    ))
}

fn no_listings() -> FakeListings {
    FakeListings { results: Some(Vec::new()) }
}

fn request(method: Method, uri: &str, body: &str) -> Request<Full<Bytes>> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Full::new(Bytes::from(body.to_string())))
        .unwrap()
}

async fn json_body(response: HttpResponse) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn test_scrape_returns_extracted_emails() {
    let fetcher = FakeFetcher::serving(
        "<footer>Sales@Acme.com | sales@acme.com</footer>",
        &["mailto:Support@Acme.com"],
    );
    let state = state(fetcher, no_listings());

    let response = handle(
        state,
        request(Method::GET, "/scrape?url=https%3A%2F%2Facme.com", ""),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["content-type"], "application/json");
    assert_eq!(
        json_body(response).await,
        json!({ "emails": ["sales@acme.com", "support@acme.com"] })
    );
}

#[tokio::test]
async fn test_scrape_completes_missing_scheme() {
    let fetcher = Arc::new(FakeFetcher::serving("", &[]));
    let state = Arc::new(AppState::new(
        fetcher.clone(),
        Arc::new(no_listings()),
        &ServerConfig::default(),
    ));

    let response = handle(state, request(Method::GET, "/scrape?url=acme.com", "")).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({ "emails": [] }));
    assert_eq!(*fetcher.requested.lock().unwrap(), vec!["https://acme.com/"]);
}

#[tokio::test]
async fn test_scrape_without_url_is_bad_request() {
    let state = state(FakeFetcher::serving("a@b.io", &[]), no_listings());

    let response = handle(state, request(Method::GET, "/scrape", "")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "URL parameter is required" })
    );
}

#[tokio::test]
async fn test_scrape_with_invalid_url_is_bad_request() {
    let state = state(FakeFetcher::serving("a@b.io", &[]), no_listings());

    let response = handle(state, request(Method::GET, "/scrape?url=ftp%3A%2F%2Fx.io", "")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "error": "Invalid URL parameter" })
    );
}

#[tokio::test]
async fn test_scrape_failure_hides_cause() {
    let state = state(FakeFetcher::failing(), no_listings());

    let response = handle(state, request(Method::GET, "/scrape?url=acme.com", "")).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body, json!({ "error": "Failed to scrape emails" }));
    assert!(!body.to_string().contains("10.0.0.9"));
}

#[tokio::test]
async fn test_listings_success() {
    let listings = FakeListings {
        results: Some(vec![Listing {
            title: Some("Joe's Coffee".into()),
            link: Some("https://maps.example/joe".into()),
            address: None,
            website: Some("https://joes.coffee".into()),
        }]),
    };
    let state = state(FakeFetcher::failing(), listings);

    let response = handle(
        state,
        request(
            Method::POST,
            "/scrape-listings",
            r#"{"query": "coffee", "location": "Austin"}"#,
        ),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({
            "success": true,
            "results": [{
                "title": "Joe's Coffee",
                "link": "https://maps.example/joe",
                "website": "https://joes.coffee"
            }]
        })
    );
}

#[tokio::test]
async fn test_listings_rejects_malformed_body() {
    let state = state(FakeFetcher::failing(), no_listings());

    let response = handle(state, request(Method::POST, "/scrape-listings", "{not json")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_listings_rejects_blank_query() {
    let state = state(FakeFetcher::failing(), no_listings());

    let response = handle(
        state,
        request(Method::POST, "/scrape-listings", r#"{"query": "  ", "location": "Austin"}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "success": false, "error": "query is required" })
    );
}

#[tokio::test]
async fn test_listings_failure_reports_message() {
    let state = state(FakeFetcher::failing(), FakeListings { results: None });

    let response = handle(
        state,
        request(Method::POST, "/scrape-listings", r#"{"query": "coffee", "location": ""}"#),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = json_body(response).await;
    assert_eq!(body["success"], json!(false));
    assert!(body["error"].as_str().unwrap().contains("No listings appeared within 5000ms"));
}

#[tokio::test]
async fn test_unknown_path_is_not_found() {
    let state = state(FakeFetcher::failing(), no_listings());

    let response = handle(state, request(Method::GET, "/", "")).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json_body(response).await, json!({ "error": "Not found" }));
}

#[tokio::test]
async fn test_wrong_method_is_not_allowed() {
    let state = state(FakeFetcher::failing(), no_listings());

    let scrape = handle(state.clone(), request(Method::POST, "/scrape?url=a.io", "")).await;
    let listings = handle(state, request(Method::GET, "/scrape-listings", "")).await;

    assert_eq!(scrape.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(listings.status(), StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(json_body(listings).await, json!({ "error": "Method not allowed" }));
}
