//! Script-rendered page loading through headless Chromium
//!
//! One browser and one tab live for the whole crawl. Each load navigates the
//! tab, waits `render_wait` for client-side scripts, then reads the resulting
//! DOM. Requires the `render` cargo feature.

use crate::config::CrawlConfig;
use crate::crawler::fetcher::PageSource;
use crate::HarvestError;
use std::collections::BTreeMap;

#[cfg(feature = "render")]
pub use enabled::RenderedFetch;

/// Configured headers the browser sends in addition to its own
///
/// The User-Agent is applied through the emulation override instead, so it is
/// left out here.
pub fn extra_headers(config: &CrawlConfig) -> BTreeMap<String, String> {
    config
        .headers
        .iter()
        .filter(|(name, _)| !name.eq_ignore_ascii_case("user-agent"))
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect()
}

/// Launches the rendering backend for `config`
pub async fn launch_source(config: &CrawlConfig) -> Result<Box<dyn PageSource>, HarvestError> {
    #[cfg(feature = "render")]
    {
        let source = RenderedFetch::launch(config).await?;
        Ok(Box::new(source))
    }

    #[cfg(not(feature = "render"))]
    {
        let _ = config;
        Err(HarvestError::Render(
            "rendered fetch mode requires the `render` feature".to_string(),
        ))
    }
}

#[cfg(feature = "render")]
mod enabled {
    use crate::config::CrawlConfig;
    use crate::crawler::fetcher::{FetchError, PageSource};
    use crate::HarvestError;
    use async_trait::async_trait;
    use chromiumoxide::browser::{Browser, BrowserConfig};
    use chromiumoxide::cdp::browser_protocol::network::{Headers, SetExtraHttpHeadersParams};
    use chromiumoxide::Page;
    use futures::StreamExt;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    /// Headless Chromium session shared by every fetch of one crawl
    pub struct RenderedFetch {
        browser: Browser,
        page: Page,
        handler: Option<JoinHandle<()>>,
        render_wait: Duration,
        released: bool,
    }

    impl RenderedFetch {
        /// Starts the browser, opens one tab and applies the configured headers
        pub async fn launch(config: &CrawlConfig) -> Result<Self, HarvestError> {
            let browser_config = BrowserConfig::builder()
                .build()
                .map_err(HarvestError::Render)?;

            let (mut browser, mut handler) = Browser::launch(browser_config)
                .await
                .map_err(|e| HarvestError::Render(format!("failed to launch browser: {}", e)))?;

            let handler = tokio::spawn(async move {
                while let Some(event) = handler.next().await {
                    if event.is_err() {
                        break;
                    }
                }
            });

            let page = match open_page(&browser, config).await {
                Ok(page) => page,
                Err(e) => {
                    // Do not leak the browser process when setup fails
                    let _ = browser.close().await;
                    let _ = browser.wait().await;
                    handler.abort();
                    return Err(e);
                }
            };

            tracing::info!("Headless browser started for rendered fetching");

            Ok(Self {
                browser,
                page,
                handler: Some(handler),
                render_wait: config.render_wait,
                released: false,
            })
        }
    }

    async fn open_page(browser: &Browser, config: &CrawlConfig) -> Result<Page, HarvestError> {
        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Render(format!("failed to open tab: {}", e)))?;

        page.set_user_agent(config.user_agent())
            .await
            .map_err(|e| HarvestError::Render(format!("failed to set user agent: {}", e)))?;

        let extra = super::extra_headers(config);
        if !extra.is_empty() {
            let headers: serde_json::Map<String, serde_json::Value> = extra
                .into_iter()
                .map(|(name, value)| (name, serde_json::Value::String(value)))
                .collect();
            page.execute(SetExtraHttpHeadersParams::new(Headers::new(
                serde_json::Value::Object(headers),
            )))
            .await
            .map_err(|e| HarvestError::Render(format!("failed to set headers: {}", e)))?;
        }

        Ok(page)
    }

    #[async_trait]
    impl PageSource for RenderedFetch {
        async fn load(&mut self, url: &str) -> Result<String, FetchError> {
            self.page.goto(url).await.map_err(|e| FetchError::Render {
                url: url.to_string(),
                message: e.to_string(),
            })?;

            if !self.render_wait.is_zero() {
                tokio::time::sleep(self.render_wait).await;
            }

            self.page.content().await.map_err(|e| FetchError::Render {
                url: url.to_string(),
                message: e.to_string(),
            })
        }

        async fn release(&mut self) {
            if self.released {
                return;
            }
            self.released = true;

            if let Err(e) = self.browser.close().await {
                tracing::warn!("Failed to close browser: {}", e);
            }
            if let Err(e) = self.browser.wait().await {
                tracing::warn!("Failed waiting for browser exit: {}", e);
            }
            if let Some(handler) = self.handler.take() {
                let _ = handler.await;
            }
            tracing::info!("Headless browser closed");
        }

        fn name(&self) -> &'static str {
            "rendered"
        }
    }
}
