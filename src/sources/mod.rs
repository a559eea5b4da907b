pub mod python_org;
pub mod simplify;

use std::sync::Arc;

use anyhow::Result;
use headless_chrome::Tab;
use rusqlite::Connection;
use tracing::{error, info};

use crate::browser;

/// Candidate-record cap per source per run.
pub const MAX_JOBS_PER_SOURCE: usize = 15;

/// One scraping strategy. `scrape` returns the count of newly persisted
/// records; a returned error is the strategy giving up on its whole source,
/// which the coordinator absorbs.
pub trait JobSource {
    fn name(&self) -> &'static str;
    fn scrape(&mut self, conn: &Connection) -> Result<usize>;
}

/// Run every source strictly in sequence against one shared tab, isolating
/// per-source failures. Returns the total number of newly inserted rows.
pub fn run_all(tab: &Arc<Tab>, conn: &Connection, only: Option<&str>) -> usize {
    let mut sources: Vec<Box<dyn JobSource>> = vec![
        Box::new(python_org::PythonOrgSource::new(Arc::clone(tab))),
        Box::new(simplify::SimplifySource::new(Arc::clone(tab))),
    ];
    if let Some(filter) = only {
        sources.retain(|s| s.name().eq_ignore_ascii_case(filter));
        if sources.is_empty() {
            error!("no source named '{}'", filter);
            return 0;
        }
    }
    drive(&mut sources, conn)
}

fn drive(sources: &mut [Box<dyn JobSource>], conn: &Connection) -> usize {
    let mut total = 0;
    for (i, source) in sources.iter_mut().enumerate() {
        if i > 0 {
            browser::human_delay(2000, 4000);
        }
        match source.scrape(conn) {
            Ok(inserted) => {
                info!("{}: {} new jobs inserted", source.name(), inserted);
                total += inserted;
            }
            Err(e) => error!("{} failed: {:#}", source.name(), e),
        }
    }
    total
}

// ── Tests ──
