//! Request routing and JSON responses

use crate::config::ServerConfig;
use crate::{Error, Result};
use harvest_browser::{ListingSource, PageFetcher};
use harvest_core::ListingQuery;
use http::header::{CONTENT_TYPE, HeaderValue};
use http::{Method, Request, Response, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes};
use serde::Serialize;
use serde_json::json;
use std::fmt::Display;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Semaphore, SemaphorePermit};
use url::Url;

pub type HttpResponse = Response<Full<Bytes>>;

const MISSING_URL: &str = "URL parameter is required";
const INVALID_URL: &str = "Invalid URL parameter";
const SCRAPE_FAILED: &str = "Failed to scrape emails";

/// Everything a request needs, shared across connections
pub struct AppState {
    fetcher: Arc<dyn PageFetcher>,
    listings: Arc<dyn ListingSource>,
    sessions: Semaphore,
    page_timeout: Duration,
    listing_timeout: Duration,
}

impl AppState {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        listings: Arc<dyn ListingSource>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            fetcher,
            listings,
            sessions: Semaphore::new(config.max_sessions.max(1)),
            page_timeout: config.page_timeout,
            listing_timeout: config.listing_timeout,
        }
    }

    async fn session_permit(&self) -> Result<SemaphorePermit<'_>> {
        self.sessions
            .acquire()
            .await
            .map_err(|e| Error::Server(format!("Session pool closed: {}", e)))
    }
}

/// Route one request
pub async fn handle<B>(state: Arc<AppState>, req: Request<B>) -> HttpResponse
where
    B: Body,
    B::Error: Display,
{
    tracing::debug!("{} {}", req.method(), req.uri());

    match (req.method(), req.uri().path()) {
        (&Method::GET, "/scrape") => {
            let query = req.uri().query().map(str::to_string);
            scrape_emails(&state, query.as_deref()).await
        }
        (&Method::POST, "/scrape-listings") => scrape_listings(&state, req.into_body()).await,
        (_, "/scrape") | (_, "/scrape-listings") => json_response(
            StatusCode::METHOD_NOT_ALLOWED,
            &json!({ "error": "Method not allowed" }),
        ),
        _ => json_response(StatusCode::NOT_FOUND, &json!({ "error": "Not found" })),
    }
}

async fn scrape_emails(state: &AppState, query: Option<&str>) -> HttpResponse {
    let url = match target_url(query) {
        Ok(url) => url,
        Err(e) => return json_response(e.status(), &json!({ "error": e.to_string() })),
    };

    match fetch_emails(state, &url).await {
        Ok(emails) => json_response(StatusCode::OK, &json!({ "emails": emails })),
        Err(e) => {
            tracing::error!("Failed to scrape {}: {}", url, e);
            json_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                &json!({ "error": SCRAPE_FAILED }),
            )
        }
    }
}

async fn fetch_emails(state: &AppState, url: &Url) -> Result<Vec<String>> {
    let _permit = state.session_permit().await?;
    let page = state.fetcher.fetch(url.as_str(), state.page_timeout).await?;
    let emails = harvest_core::extract(&page.text, &page.mailto_targets);

    tracing::info!("Found {} email(s) on {}", emails.len(), url);
    Ok(emails.to_strings())
}

async fn scrape_listings<B>(state: &AppState, body: B) -> HttpResponse
where
    B: Body,
    B::Error: Display,
{
    match search_listings(state, body).await {
        Ok(results) => json_response(
            StatusCode::OK,
            &json!({ "success": true, "results": results }),
        ),
        Err(e) => {
            if !matches!(e, Error::Validation(_)) {
                tracing::error!("Listing search failed: {}", e);
            }
            json_response(e.status(), &json!({ "success": false, "error": e.to_string() }))
        }
    }
}

async fn search_listings<B>(state: &AppState, body: B) -> Result<Vec<harvest_core::Listing>>
where
    B: Body,
    B::Error: Display,
{
    let bytes = body
        .collect()
        .await
        .map_err(|e| Error::Validation(format!("Failed to read request body: {}", e)))?
        .to_bytes();

    let query: ListingQuery = serde_json::from_slice(&bytes)
        .map_err(|e| Error::Validation(format!("Invalid request body: {}", e)))?;
    query.validate()?;

    let _permit = state.session_permit().await?;
    Ok(state.listings.search(&query, state.listing_timeout).await?)
}

/// The `url` query parameter as an absolute http(s) URL
pub fn target_url(query: Option<&str>) -> Result<Url> {
    let raw = query
        .and_then(|q| {
            url::form_urlencoded::parse(q.as_bytes())
                .find(|(key, _)| key == "url")
                .map(|(_, value)| value.into_owned())
        })
        .ok_or_else(|| Error::Validation(MISSING_URL.to_string()))?;

    normalize_target(&raw)
}

/// Parse a user-supplied page address, completing a missing scheme with `https://`
pub fn normalize_target(raw: &str) -> Result<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::Validation(MISSING_URL.to_string()));
    }

    let absolute = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("https://{}", raw)
    };

    let url = Url::parse(&absolute).map_err(|_| Error::Validation(INVALID_URL.to_string()))?;

    match url.scheme() {
        "http" | "https" if url.host_str().is_some_and(|h| !h.is_empty()) => Ok(url),
        _ => Err(Error::Validation(INVALID_URL.to_string())),
    }
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> HttpResponse {
    let (status, bytes) = match serde_json::to_vec(body) {
        Ok(bytes) => (status, bytes),
        Err(e) => {
            tracing::error!("Failed to serialize response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Internal server error"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Full::new(Bytes::from(bytes)));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}
