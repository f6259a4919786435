//! HTTP front end for the email and listing scrapers

pub mod config;
pub mod error;
pub mod handler;
pub mod server;

pub use config::ServerConfig;
pub use error::{Error, Result};
pub use handler::{AppState, HttpResponse, handle, normalize_target};
pub use server::ScrapeServer;
