use crate::Result;
use chromiumoxide::cdp::browser_protocol::fetch::{
    ContinueRequestParams, EnableParams, EventRequestPaused, FailRequestParams,
};
use chromiumoxide::cdp::browser_protocol::network::{ErrorReason, ResourceType};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

/// Fails requests for unwanted resource types while it is alive
///
/// Interception stops when the blocker drops; the page must not outlive it
/// while still loading.
pub struct ResourceBlocker {
    task: Option<JoinHandle<()>>,
}

impl ResourceBlocker {
    /// Intercept every request on `page`, failing those whose type is in `blocked`
    pub async fn install(page: &Page, blocked: &[ResourceType]) -> Result<Self> {
        if blocked.is_empty() {
            return Ok(Self { task: None });
        }

        let mut paused = page.event_listener::<EventRequestPaused>().await?;
        page.execute(EnableParams::default()).await?;

        let page = page.clone();
        let blocked = blocked.to_vec();

        let task = tokio::spawn(async move {
            while let Some(event) = paused.next().await {
                let request_id = event.request_id.clone();

                let outcome = if is_blocked(&blocked, &event.resource_type) {
                    tracing::trace!("Blocking {:?} {}", event.resource_type, event.request.url);
                    page.execute(FailRequestParams::new(
                        request_id,
                        ErrorReason::BlockedByClient,
                    ))
                    .await
                    .map(|_| ())
                } else {
                    page.execute(ContinueRequestParams::new(request_id))
                        .await
                        .map(|_| ())
                };

                if let Err(e) = outcome {
                    tracing::debug!("Failed to resolve intercepted request: {}", e);
                }
            }
        });

        Ok(Self { task: Some(task) })
    }
}

impl Drop for ResourceBlocker {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

fn is_blocked(blocked: &[ResourceType], resource_type: &ResourceType) -> bool {
    blocked.contains(resource_type)
}
