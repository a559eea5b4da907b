use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use headless_chrome::Tab;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tracing::{debug, error, info, warn};

use super::{JobSource, MAX_JOBS_PER_SOURCE};
use crate::browser;
use crate::db::{self, JobRecord};
use crate::extract::cards::{self, CardFields};
use crate::normalize;

const SOURCE_SITE: &str = "SimplifyJobs";
const SEARCH_URL: &str = "https://simplify.jobs/jobs?query=software+engineer";
const DETAIL_URL_BASE: &str = "https://simplify.jobs/p";
const SEARCH_QUERY_URL: &str = "https://simplify.jobs/jobs?query=";
const NAV_TIMEOUT: Duration = Duration::from_secs(60);
const CARD_WAIT: Duration = Duration::from_secs(15);
const SCROLL_STEPS: usize = 3;

/// Client-rendered source. Primary path: intercept the SPA's internal API
/// responses while the page loads and lazy-loads. Fallback: parse the
/// rendered card grid. The two paths never mix within a run.
pub struct SimplifySource {
    tab: Arc<Tab>,
    captured: Arc<Mutex<Vec<Map<String, Value>>>>,
}

impl SimplifySource {
    pub fn new(tab: Arc<Tab>) -> Self {
        Self {
            tab,
            captured: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn scrape_from_dom(&self, conn: &Connection) -> usize {
        if self
            .tab
            .wait_for_element_with_custom_timeout("h3", CARD_WAIT)
            .is_err()
        {
            warn!("simplify.jobs: timed out waiting for job card elements");
            return 0;
        }

        let html = match self.tab.get_content() {
            Ok(html) => html,
            Err(e) => {
                warn!("simplify.jobs: could not read rendered page: {:#}", e);
                return 0;
            }
        };
        let cards = cards::parse(&html);
        info!("simplify.jobs: DOM fallback found {} potential cards", cards.len());

        let mut inserted = 0;
        for (idx, card) in cards.into_iter().take(MAX_JOBS_PER_SOURCE).enumerate() {
            let record = card_to_record(card, idx);
            match db::insert_job(conn, &record) {
                Ok(true) => inserted += 1,
                Ok(false) => {}
                Err(e) => error!("  insert failed for '{}': {:#}", record.title, e),
            }
        }
        inserted
    }
}

impl JobSource for SimplifySource {
    fn name(&self) -> &'static str {
        "simplify"
    }

    fn scrape(&mut self, conn: &Connection) -> Result<usize> {
        info!("simplify.jobs: starting");

        // must be registered before navigation so the initial page load's
        // responses are observed
        browser::sniff_json_responses(&self.tab, Arc::clone(&self.captured))?;

        if let Err(e) = browser::goto(&self.tab, SEARCH_URL, NAV_TIMEOUT) {
            warn!("simplify.jobs: page load issue (may still have data): {:#}", e);
        }
        browser::human_delay(2000, 4000);

        for _ in 0..SCROLL_STEPS {
            if let Err(e) = browser::scroll_by_viewport(&self.tab) {
                debug!("simplify.jobs: scroll step failed: {:#}", e);
            }
            browser::human_delay(1000, 2500);
        }

        let captured: Vec<Map<String, Value>> = {
            let mut buffer = self
                .captured
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            buffer.drain(..).collect()
        };

        let inserted = if captured.is_empty() {
            info!("simplify.jobs: no API data intercepted, falling back to DOM parsing");
            self.scrape_from_dom(conn)
        } else {
            info!(
                "simplify.jobs: intercepted {} jobs from API responses",
                captured.len()
            );
            let take = captured.len().min(MAX_JOBS_PER_SOURCE);
            let mut count = 0;
            for (i, raw) in captured.into_iter().take(MAX_JOBS_PER_SOURCE).enumerate() {
                let record =
                    normalize::map_api_job(&raw, SOURCE_SITE, DETAIL_URL_BASE, SEARCH_QUERY_URL);
                info!("  [{}/{}] {}", i + 1, take, record.title);
                match db::insert_job(conn, &record) {
                    Ok(true) => count += 1,
                    Ok(false) => {}
                    Err(e) => error!("  insert failed for '{}': {:#}", record.title, e),
                }
            }
            count
        };

        info!("simplify.jobs: done, {} new jobs", inserted);
        Ok(inserted)
    }
}

/// A DOM card has no detail page of its own; the record gets a synthetic
/// description and a fragment-suffixed search URL as its identity.
fn card_to_record(card: CardFields, idx: usize) -> JobRecord {
    let description = format!("Job listing for {} at {}.", card.title, card.company);
    JobRecord {
        title: card.title,
        company_name: card.company,
        description,
        wage: card.wage,
        location_requirement: card
            .location_requirement
            .unwrap_or_else(|| "Not specified".to_string()),
        experience_level: card.experience_level,
        location: card.location,
        source_url: format!("{}#card-{}", SEARCH_URL, idx),
        source_site: SOURCE_SITE.to_string(),
        posted_at: None,
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dom_card_record_shape() {
        let record = card_to_record(
            CardFields {
                title: "Frontend Engineer".into(),
                company: "Acme Corp".into(),
                wage: Some("$120K/yr - $150K/yr".into()),
                location: "San Francisco, CA".into(),
                location_requirement: Some("Remote in USA".into()),
                experience_level: Some("Senior".into()),
            },
            0,
        );
        assert_eq!(
            record.description,
            "Job listing for Frontend Engineer at Acme Corp."
        );
        assert_eq!(
            record.source_url,
            "https://simplify.jobs/jobs?query=software+engineer#card-0"
        );
        assert_eq!(record.source_site, "SimplifyJobs");
        assert_eq!(record.posted_at, None);
    }

    #[test]
    fn dom_card_defaults_when_sparse() {
        let record = card_to_record(
            CardFields {
                title: "Backend Developer".into(),
                company: "Unknown".into(),
                wage: None,
                location: "Not specified".into(),
                location_requirement: None,
                experience_level: None,
            },
            7,
        );
        assert_eq!(record.location_requirement, "Not specified");
        assert!(record.source_url.ends_with("#card-7"));
    }
}
