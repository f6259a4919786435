use crate::config::ServerConfig;
use crate::handler::{AppState, handle};
use crate::Result;
use harvest_browser::{ListingSource, PageFetcher};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinSet;

/// HTTP server exposing the email and listing scrapers
pub struct ScrapeServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl ScrapeServer {
    pub fn new(
        config: ServerConfig,
        fetcher: Arc<dyn PageFetcher>,
        listings: Arc<dyn ListingSource>,
    ) -> Self {
        let state = Arc::new(AppState::new(fetcher, listings, &config));
        Self { config, state }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Bind the configured address and serve until `shutdown` resolves
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let listener = TcpListener::bind(self.config.addr()).await?;
        self.serve(listener, shutdown).await
    }

    /// Serve connections from an already bound listener
    ///
    /// Once `shutdown` resolves no new connections are accepted and open ones
    /// are asked to finish; any still running after the grace period are
    /// dropped.
    pub async fn serve<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        let addr = listener.local_addr()?;
        tracing::info!("Listening on http://{}", addr);

        let (closing_tx, closing_rx) = watch::channel(false);
        let mut connections = JoinSet::new();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::info!("Shutdown requested, no longer accepting connections");
                    break;
                }
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, peer)) => {
                            let state = Arc::clone(&self.state);
                            let closing = closing_rx.clone();
                            connections.spawn(serve_connection(stream, peer, state, closing));
                        }
                        Err(e) => tracing::warn!("Failed to accept connection: {}", e),
                    }
                }
                Some(_) = connections.join_next(), if !connections.is_empty() => {}
            }
        }

        drop(listener);
        let _ = closing_tx.send(true);

        let drain = async { while connections.join_next().await.is_some() {} };
        if tokio::time::timeout(self.config.shutdown_grace, drain)
            .await
            .is_err()
        {
            tracing::warn!(
                "{} connection(s) still open after {}s, dropping them",
                connections.len(),
                self.config.shutdown_grace.as_secs()
            );
            connections.abort_all();
        }

        tracing::info!("Server on {} stopped", addr);
        Ok(())
    }
}

async fn serve_connection(
    stream: tokio::net::TcpStream,
    peer: SocketAddr,
    state: Arc<AppState>,
    mut closing: watch::Receiver<bool>,
) {
    let service = service_fn(move |req| {
        let state = Arc::clone(&state);
        async move { Ok::<_, Infallible>(handle(state, req).await) }
    });

    let conn = http1::Builder::new().serve_connection(TokioIo::new(stream), service);
    tokio::pin!(conn);

    let outcome = tokio::select! {
        outcome = conn.as_mut() => outcome,
        _ = closing.changed() => {
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = outcome {
        tracing::debug!("Connection from {} ended with error: {}", peer, e);
    }
}
