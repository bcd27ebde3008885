use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep};
use tracing::{debug, info, warn};

use crate::error::RenderError;

/// The source injects chapter pages client-side, so a chapter counts as
/// rendered only once this element shows up in the live DOM.
pub const IMAGE_CONTAINER_SELECTOR: &str = "div.chapter-image-container img";

const RENDER_TIMEOUT: Duration = Duration::from_secs(20);
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Seam over the browser session. The crawl loop owns the one live session
/// and hands it by reference to whatever needs the rendered DOM.
#[async_trait]
pub trait Renderer: Send + Sync {
    /// Navigates to `url` and returns the document markup once the chapter
    /// image container has appeared, within a bounded timeout.
    async fn render(&self, url: &str) -> Result<String, RenderError>;

    /// Polls the live DOM for an anchor matching `selector` and reads its
    /// target. `None` when the element never becomes available.
    async fn wait_for_link(&self, selector: &str, timeout: Duration) -> Option<String>;

    /// Tears the session down. Called exactly once, on every exit path.
    async fn close(self);
}

pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch() -> Result<Self> {
        let config = BrowserConfig::builder()
            .args([
                "--disable-gpu",
                "--no-sandbox",
                "--disable-dev-shm-usage",
                "--user-agent=Mozilla/5.0",
            ])
            .build()
            .map_err(|e| anyhow::anyhow!("browser config error: {e}"))?;

        let (browser, mut handler) = Browser::launch(config).await?;
        let handler_task = tokio::spawn(async move { while handler.next().await.is_some() {} });
        let page = browser.new_page("about:blank").await?;

        info!("headless browser session started");
        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    async fn element_appears(&self, selector: &str, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.page.find_element(selector).await.is_ok() {
                return true;
            }
            if Instant::now() >= deadline {
                return false;
            }
            sleep(POLL_INTERVAL).await;
        }
    }
}

#[async_trait]
impl Renderer for ChromeSession {
    async fn render(&self, url: &str) -> Result<String, RenderError> {
        self.page
            .goto(url)
            .await
            .map_err(|e| RenderError::Navigation {
                url: url.to_owned(),
                reason: e.to_string(),
            })?;

        if !self.element_appears(IMAGE_CONTAINER_SELECTOR, RENDER_TIMEOUT).await {
            return Err(RenderError::ElementTimeout {
                url: url.to_owned(),
                selector: IMAGE_CONTAINER_SELECTOR.to_owned(),
                timeout_secs: RENDER_TIMEOUT.as_secs(),
            });
        }

        self.page.content().await.map_err(|e| RenderError::Content {
            url: url.to_owned(),
            reason: e.to_string(),
        })
    }

    async fn wait_for_link(&self, selector: &str, timeout: Duration) -> Option<String> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Ok(element) = self.page.find_element(selector).await {
                match element.attribute("href").await {
                    Ok(href) => return href,
                    Err(e) => {
                        debug!("could not read href from `{selector}`: {e}");
                        return None;
                    }
                }
            }
            if Instant::now() >= deadline {
                return None;
            }
            sleep(POLL_INTERVAL).await;
        }
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("browser close failed: {e}");
        }
        let _ = self.browser.wait().await;
        self.handler_task.abort();
        info!("browser session released");
    }
}
