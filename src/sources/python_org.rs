use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;
use rusqlite::Connection;
use scraper::{Html, Selector};
use tracing::{error, info, warn};

use super::{JobSource, MAX_JOBS_PER_SOURCE};
use crate::browser;
use crate::db::{self, JobRecord};
use crate::extract::listing::{self, ListingCard};
use crate::infer;

const SOURCE_SITE: &str = "Python.org";
const BASE_URL: &str = "https://www.python.org";
const LISTING_URL: &str = "https://www.python.org/jobs/";
const NAV_TIMEOUT: Duration = Duration::from_secs(30);

/// Server-rendered source: one listing page enumerates the jobs, each
/// detail page carries the description.
pub struct PythonOrgSource {
    tab: Arc<Tab>,
}

impl PythonOrgSource {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self { tab }
    }

    fn enrich_from_detail(&self, card: ListingCard) -> JobRecord {
        let description = match browser::goto(&self.tab, &card.source_url, NAV_TIMEOUT) {
            Ok(()) => {
                browser::human_delay(500, 1500);
                self.tab
                    .get_content()
                    .map(|html| description_text(&html))
                    .unwrap_or_default()
            }
            Err(e) => {
                warn!("could not load detail page {}: {:#}", card.source_url, e);
                String::new()
            }
        };
        build_record(card, description)
    }
}

impl JobSource for PythonOrgSource {
    fn name(&self) -> &'static str {
        "python.org"
    }

    fn scrape(&mut self, conn: &Connection) -> Result<usize> {
        info!("python.org: starting");

        if let Err(e) = browser::goto(&self.tab, LISTING_URL, NAV_TIMEOUT) {
            warn!("python.org: failed to load {}: {:#}", LISTING_URL, e);
            return Ok(0);
        }
        browser::human_delay(1000, 4000);

        let html = match self.tab.get_content() {
            Ok(html) => html,
            Err(e) => {
                warn!("python.org: could not read listing page: {:#}", e);
                return Ok(0);
            }
        };
        let cards = listing::parse(&html, BASE_URL);
        info!("python.org: found {} job cards on listing page", cards.len());

        let take = cards.len().min(MAX_JOBS_PER_SOURCE);
        let mut inserted = 0;
        for (i, card) in cards.into_iter().take(MAX_JOBS_PER_SOURCE).enumerate() {
            info!("  [{}/{}] {}", i + 1, take, card.title);
            let record = self.enrich_from_detail(card);
            match db::insert_job(conn, &record) {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => error!("  insert failed for '{}': {:#}", record.title, e),
            }
            browser::human_delay(1000, 4000);
        }

        info!("python.org: done, {} new jobs", inserted);
        Ok(inserted)
    }
}

fn description_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let desc_sel = Selector::parse("div.job-description").unwrap();
    document
        .select(&desc_sel)
        .next()
        .map(|el| {
            el.text()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .collect::<Vec<_>>()
                .join("\n")
        })
        .unwrap_or_default()
}

/// Merge listing-card metadata with the detail-page description and the
/// inferred fields into a persistable record.
fn build_record(card: ListingCard, description: String) -> JobRecord {
    let wage = if description.is_empty() {
        None
    } else {
        infer::extract_salary(&description)
    };
    let experience_level =
        infer::infer_experience_level(&card.title, &description).map(str::to_string);
    let location_requirement =
        infer::infer_location_requirement(&card.title, &card.location, &description).to_string();

    JobRecord {
        title: card.title,
        company_name: card.company,
        description: if description.is_empty() {
            "No description available.".to_string()
        } else {
            description
        },
        wage,
        location_requirement,
        experience_level,
        location: card.location,
        source_url: card.source_url,
        source_site: SOURCE_SITE.to_string(),
        posted_at: card.posted_at,
    }
}

// ── Tests ──
