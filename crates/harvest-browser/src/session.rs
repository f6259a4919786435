//! Browser session lifecycle
//!
//! Each fetch runs in its own Chrome process with its own scratch profile.
//! [`SessionFactory::scoped`] launches the process, hands a fresh page to the
//! caller's work, and closes the browser on every exit path.

use crate::launcher::ChromeLauncher;
use crate::profile::ScratchProfile;
use crate::{Error, Result};
use chromiumoxide::browser::Browser;
use chromiumoxide::page::Page;
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;

/// How long a closed browser gets to exit before it is killed
const EXIT_GRACE: Duration = Duration::from_secs(5);

/// Counts live browser sessions
#[derive(Debug, Clone, Default)]
pub struct SessionTracker {
    active: Arc<AtomicUsize>,
}

impl SessionTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn active(&self) -> usize {
        self.active.load(Ordering::SeqCst)
    }

    /// Register a session; it counts as live until the lease drops
    pub fn lease(&self) -> SessionLease {
        self.active.fetch_add(1, Ordering::SeqCst);
        SessionLease {
            active: Arc::clone(&self.active),
        }
    }
}

/// Held by a live session
#[derive(Debug)]
pub struct SessionLease {
    active: Arc<AtomicUsize>,
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// A running Chrome process and the task driving its CDP connection
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
    // Dropped after `browser`. Only `close()` waits for Chrome to exit first;
    // any other drop path removes the profile while Chrome may still run.
    _profile: ScratchProfile,
    _lease: SessionLease,
}

impl BrowserSession {
    pub async fn launch(
        launcher: &ChromeLauncher,
        request_timeout: Duration,
        tracker: &SessionTracker,
    ) -> Result<Self> {
        let lease = tracker.lease();
        let profile = ScratchProfile::create()?;
        let config = launcher.browser_config(&profile, request_timeout)?;

        tracing::debug!("Launching Chrome from {}", launcher.chrome_path().display());

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| Error::Browser(format!("Failed to launch Chrome: {}", e)))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::trace!("CDP handler event error (continuing): {}", e);
                }
            }
        });

        Ok(Self {
            browser,
            handler,
            _profile: profile,
            _lease: lease,
        })
    }

    pub async fn new_page(&self) -> Result<Page> {
        Ok(self.browser.new_page("about:blank").await?)
    }

    /// Close Chrome, falling back to a kill when it does not exit in time
    pub async fn close(mut self) {
        let closed = match self.browser.close().await {
            Ok(_) => match tokio::time::timeout(EXIT_GRACE, self.browser.wait()).await {
                Ok(Ok(_)) => true,
                Ok(Err(e)) => {
                    tracing::warn!("Failed to wait for browser exit: {}", e);
                    false
                }
                Err(_) => {
                    tracing::warn!("Browser did not exit within {}s", EXIT_GRACE.as_secs());
                    false
                }
            },
            Err(e) => {
                tracing::warn!("Failed to close browser cleanly: {}", e);
                false
            }
        };

        if !closed {
            if let Some(Err(e)) = self.browser.kill().await {
                tracing::warn!("Failed to kill browser: {}", e);
            }
        }

        self.handler.abort();
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Launches browser sessions that share one launcher and tracker
#[derive(Debug, Clone)]
pub struct SessionFactory {
    launcher: ChromeLauncher,
    request_timeout: Duration,
    tracker: SessionTracker,
}

impl SessionFactory {
    pub fn new(launcher: ChromeLauncher, request_timeout: Duration) -> Self {
        Self {
            launcher,
            request_timeout,
            tracker: SessionTracker::new(),
        }
    }

    /// Sessions currently open
    pub fn active_sessions(&self) -> usize {
        self.tracker.active()
    }

    /// Run `work` against a fresh page within `deadline`
    ///
    /// The browser is closed before this returns, whatever `work` produced.
    /// Expiry of the deadline surfaces as [`Error::Timeout`].
    pub async fn scoped<T, F, Fut>(&self, deadline: Duration, work: F) -> Result<T>
    where
        F: FnOnce(Page) -> Fut + Send,
        Fut: Future<Output = Result<T>> + Send,
        T: Send,
    {
        let session =
            BrowserSession::launch(&self.launcher, self.request_timeout, &self.tracker).await?;

        let run = async {
            let page = session.new_page().await?;
            work(page).await
        };

        let outcome = within_deadline(deadline, run).await;
        session.close().await;

        outcome
    }
}

/// Await `work`, mapping expiry of `deadline` to [`Error::Timeout`]
///
/// `work` is dropped on expiry, releasing whatever it owns.
async fn within_deadline<T>(deadline: Duration, work: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(deadline, work).await {
        Ok(outcome) => outcome,
        Err(_) => Err(Error::Timeout(deadline)),
    }
}
