//! Drives Chrome/Chromium over the DevTools protocol: interactive login and
//! scroll-then-extract scraping of a profile page.

pub mod extract;
pub mod session;

use std::time::Duration;

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::{Cookie, CookieParam, TimeSinceEpoch};
use chromiumoxide::Page;
use chrono::Local;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::archive::Post;
use crate::error::ArchiveError;
use crate::settings::Settings;
use extract::TextSource;
use session::{SessionState, StoredCookie};

const LOGIN_URL: &str = "https://www.facebook.com/";
const CLOSE_POPUP_SELECTOR: &str = r#"[aria-label="閉じる"]"#;
const POPUP_TIMEOUT: Duration = Duration::from_secs(2);
const POPUP_POLL: Duration = Duration::from_millis(250);
const SCROLL_JS: &str = "window.scrollBy(0, 1000)";

/// What a fetch run needs besides the session.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub url: String,
    pub scrolls: u32,
    pub show_browser: bool,
}

struct RunningBrowser {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl RunningBrowser {
    async fn launch(headless: bool, chrome_path: Option<&str>) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !headless {
            builder = builder.with_head();
        }
        if let Some(path) = chrome_path {
            builder = builder.chrome_executable(path);
        }
        let config = builder
            .build()
            .map_err(|e| ArchiveError::Browser(format!("invalid browser config: {e}")))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("Browser handler error: {e}");
                }
            }
        });

        info!(headless, "Browser launched");
        Ok(Self { browser, handler })
    }

    async fn shutdown(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {e}");
        }
        let _ = self.browser.wait().await;
        let _ = self.handler.await;
    }
}

/// Open a visible browser at the login page, wait for the user, then save cookies.
pub async fn setup_auth(settings: &Settings) -> Result<()> {
    let running = RunningBrowser::launch(false, settings.chrome_path.as_deref()).await?;
    let result = login(&running.browser, settings).await;
    running.shutdown().await;
    result
}

async fn login(browser: &Browser, settings: &Settings) -> Result<()> {
    let state_file = settings.paths().state_file;
    let page = browser
        .new_page(LOGIN_URL)
        .await
        .context("Failed to open login page")?;

    println!("Log in to Facebook in the browser window, then press Enter here.");
    wait_for_enter().await?;

    let cookies = page.get_cookies().await.context("Failed to read cookies")?;
    let state = SessionState::new(cookies.into_iter().map(stored_cookie).collect());
    state.save(&state_file)?;
    info!(cookies = state.cookies.len(), path = %state_file.display(), "Saved session state");
    Ok(())
}

/// Load the profile with saved cookies, scroll to trigger lazy loading, extract posts.
pub async fn fetch_posts(
    settings: &Settings,
    state: &SessionState,
    opts: &FetchOptions,
) -> Result<Vec<Post>> {
    let running =
        RunningBrowser::launch(!opts.show_browser, settings.chrome_path.as_deref()).await?;
    let result = scrape_profile(&running.browser, settings, state, opts).await;
    running.shutdown().await;
    result
}

async fn scrape_profile(
    browser: &Browser,
    settings: &Settings,
    state: &SessionState,
    opts: &FetchOptions,
) -> Result<Vec<Post>> {
    restore_cookies(browser, state).await?;
    let page = browser
        .new_page("about:blank")
        .await
        .context("Failed to open page")?;

    page.goto(opts.url.as_str())
        .await
        .map_err(|e| ArchiveError::Browser(format!("failed to load {}: {e}", opts.url)))?;
    tokio::time::sleep(settings.settle()).await;

    dismiss_popup(&page).await;
    scroll(&page, opts.scrolls, settings.scroll_pause()).await?;

    let texts = extract::extract_post_texts(&PageTexts(&page)).await;
    Ok(texts
        .into_iter()
        .enumerate()
        .map(|(i, text)| Post::captured(i + 1, text, Local::now()))
        .collect())
}

struct PageTexts<'a>(&'a Page);

impl TextSource for PageTexts<'_> {
    async fn element_texts(&self, selector: &str) -> Result<Vec<Option<String>>> {
        let elements = self.0.find_elements(selector).await?;
        let mut texts = Vec::with_capacity(elements.len());
        for el in &elements {
            match el.inner_text().await {
                Ok(text) => texts.push(text),
                Err(e) => {
                    debug!(selector, "Skipping element: {e}");
                    texts.push(None);
                }
            }
        }
        Ok(texts)
    }
}

async fn scroll(page: &Page, scrolls: u32, pause: Duration) -> Result<()> {
    let pb = ProgressBar::new(u64::from(scrolls));
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} scroll {pos}/{len}")?
            .progress_chars("=> "),
    );

    for _ in 0..scrolls {
        page.evaluate(SCROLL_JS).await.context("Scroll failed")?;
        tokio::time::sleep(pause).await;
        pb.inc(1);
    }

    pb.finish_and_clear();
    info!(scrolls, "Finished scrolling");
    Ok(())
}

async fn dismiss_popup(page: &Page) {
    let attempt = async {
        loop {
            if let Ok(el) = page.find_element(CLOSE_POPUP_SELECTOR).await {
                return el.click().await.map(|_| ());
            }
            tokio::time::sleep(POPUP_POLL).await;
        }
    };
    match tokio::time::timeout(POPUP_TIMEOUT, attempt).await {
        Ok(Ok(())) => debug!("Dismissed popup"),
        Ok(Err(e)) => debug!("Popup click failed: {e}"),
        Err(_) => debug!("No popup"),
    }
}

/// Cookies are set browser-wide; a page-level set is rejected while the page is blank.
async fn restore_cookies(browser: &Browser, state: &SessionState) -> Result<()> {
    let params = cookie_params(state);
    debug!(cookies = params.len(), "Restoring session cookies");
    browser
        .set_cookies(params)
        .await
        .context("Failed to restore session cookies")?;
    Ok(())
}

/// Convert saved cookies to CDP params, skipping any that fail to build.
fn cookie_params(state: &SessionState) -> Vec<CookieParam> {
    state
        .cookies
        .iter()
        .filter_map(|c| match cookie_param(c) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!(cookie = %c.name, "Skipping cookie: {e}");
                None
            }
        })
        .collect()
}

fn stored_cookie(c: Cookie) -> StoredCookie {
    StoredCookie {
        expires: (!c.session).then_some(c.expires),
        name: c.name,
        value: c.value,
        domain: c.domain,
        path: c.path,
        http_only: c.http_only,
        secure: c.secure,
    }
}

fn cookie_param(c: &StoredCookie) -> std::result::Result<CookieParam, String> {
    let mut builder = CookieParam::builder()
        .name(c.name.clone())
        .value(c.value.clone())
        .domain(c.domain.clone())
        .path(c.path.clone())
        .http_only(c.http_only)
        .secure(c.secure);
    if let Some(expires) = c.expires {
        builder = builder.expires(TimeSinceEpoch::new(expires));
    }
    builder.build()
}

async fn wait_for_enter() -> Result<()> {
    tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| ())
    })
    .await??;
    Ok(())
}
