use std::collections::HashMap;
use std::ffi::OsStr;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use headless_chrome::protocol::cdp::Network::events::ResponseReceivedEventParams;
use headless_chrome::protocol::cdp::Network::GetResponseBodyReturnObject;
use headless_chrome::{Browser, LaunchOptions, Tab};
use rand::{rng, Rng};
use serde_json::{Map, Value};
use tracing::info;

use crate::intercept;

const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/125.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36 Edg/124.0.0.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:127.0) Gecko/20100101 Firefox/127.0",
];

const VIEWPORT_POOL: &[(u32, u32)] = &[
    (1920, 1080),
    (1366, 768),
    (1536, 864),
    (1440, 900),
    (1280, 720),
];

/// Headless Chrome session with anti-bot measures: randomized user agent and
/// viewport, automation flag disabled, realistic Accept-Language. The
/// strategies only see the tab surface below; none of this leaks into them.
pub struct StealthBrowser {
    // keeps the chrome process alive; killed on drop
    _browser: Browser,
    tab: Arc<Tab>,
}

impl StealthBrowser {
    pub fn launch() -> Result<Self> {
        let user_agent = USER_AGENTS[rng().random_range(0..USER_AGENTS.len())];
        let (width, height) = VIEWPORT_POOL[rng().random_range(0..VIEWPORT_POOL.len())];

        let options = LaunchOptions::default_builder()
            .headless(true)
            .window_size(Some((width, height)))
            .args(vec![
                OsStr::new("--disable-blink-features=AutomationControlled"),
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
            ])
            .build()
            .map_err(|e| anyhow::anyhow!("building chrome launch options: {}", e))?;

        let browser = Browser::new(options).context("launching chrome")?;
        let tab = browser.new_tab().context("opening tab")?;

        tab.set_user_agent(user_agent, Some("en-US,en;q=0.9"), Some("Linux x86_64"))?;
        tab.set_extra_http_headers(HashMap::from([("Accept-Language", "en-US,en;q=0.9")]))?;

        info!(
            "browser launched  ua={}…  viewport={}x{}",
            &user_agent[..50.min(user_agent.len())],
            width,
            height
        );
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    pub fn tab(&self) -> &Arc<Tab> {
        &self.tab
    }
}

// ── Page operations ──

/// Navigate and wait for the load to settle, bounded by `timeout`.
pub fn goto(tab: &Tab, url: &str, timeout: Duration) -> Result<()> {
    tab.set_default_timeout(timeout);
    tab.navigate_to(url)?;
    tab.wait_until_navigated()?;
    Ok(())
}

/// Trigger one viewport-height scroll step, for lazy-loaded grids.
pub fn scroll_by_viewport(tab: &Tab) -> Result<()> {
    tab.evaluate("window.scrollBy(0, window.innerHeight)", false)?;
    Ok(())
}

/// Subscribe a JSON job sniffer to the tab's network responses. Job-like
/// objects land in `sink` as responses arrive; errors on individual
/// responses are swallowed so a bad body never kills the session.
pub fn sniff_json_responses(tab: &Tab, sink: Arc<Mutex<Vec<Map<String, Value>>>>) -> Result<()> {
    tab.register_response_handling(
        "job-sniffer",
        Box::new(
            move |params: ResponseReceivedEventParams,
                  fetch_body: &dyn Fn() -> Result<GetResponseBodyReturnObject>| {
                let response = params.response;
                let status = response.status as u32;
                if status != 200 || !response.mime_type.contains("json") {
                    return;
                }
                let Ok(body) = fetch_body() else {
                    return;
                };
                if body.base_64_encoded {
                    return;
                }
                if let Ok(mut captured) = sink.lock() {
                    intercept::scan_response(status, &response.mime_type, &body.body, &mut captured);
                }
            },
        ),
    )?;
    Ok(())
}

/// Sleep a random interval to mimic human pacing.
pub fn human_delay(lo_ms: u64, hi_ms: u64) {
    let ms = rng().random_range(lo_ms..=hi_ms);
    thread::sleep(Duration::from_millis(ms));
}
