use anyhow::Result;
use rusqlite::Connection;
use serde::Serialize;
use tracing::debug;

const DB_PATH: &str = "data/jobs.sqlite";

/// Canonical job record, one row in scraped_jobs.
#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub title: String,
    pub company_name: String,
    pub description: String,
    pub wage: Option<String>,
    pub location_requirement: String,
    pub experience_level: Option<String>,
    pub location: String,
    pub source_url: String,
    pub source_site: String,
    pub posted_at: Option<String>,
}

pub fn connect() -> Result<Connection> {
    let path = std::env::var("JOBS_DB").unwrap_or_else(|_| DB_PATH.to_string());
    if let Some(dir) = std::path::Path::new(&path).parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)?;
        }
    }
    let conn = Connection::open(&path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS scraped_jobs (
            id                   INTEGER PRIMARY KEY,
            title                TEXT NOT NULL,
            company_name         TEXT NOT NULL,
            description          TEXT NOT NULL,
            wage                 TEXT,
            location_requirement TEXT NOT NULL,
            experience_level     TEXT,
            location             TEXT NOT NULL,
            -- dedup key; synthetic search-query URLs can collide for
            -- identical titles, which drops those postings as duplicates
            source_url           TEXT UNIQUE NOT NULL,
            source_site          TEXT NOT NULL,
            posted_at            TEXT,
            created_at           TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_jobs_site ON scraped_jobs(source_site);
        ",
    )?;
    Ok(())
}

// ── Inserts ──

/// Insert one record; conflicts on source_url are silently skipped.
/// Returns true iff a new row was written.
pub fn insert_job(conn: &Connection, job: &JobRecord) -> Result<bool> {
    let mut stmt = conn.prepare_cached(
        "INSERT OR IGNORE INTO scraped_jobs
         (title, company_name, description, wage, location_requirement,
          experience_level, location, source_url, source_site, posted_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
    )?;
    let written = stmt.execute(rusqlite::params![
        job.title,
        job.company_name,
        job.description,
        job.wage,
        job.location_requirement,
        job.experience_level,
        job.location,
        job.source_url,
        job.source_site,
        job.posted_at,
    ])?;
    if written == 0 {
        debug!("duplicate skipped: {}", job.title);
    }
    Ok(written > 0)
}

// ── Reporting ──

pub struct Stats {
    pub total: usize,
    pub with_wage: usize,
    pub remote: usize,
    pub by_site: Vec<(String, usize)>,
}

pub fn get_stats(conn: &Connection) -> Result<Stats> {
    let total: usize = conn.query_row("SELECT COUNT(*) FROM scraped_jobs", [], |r| r.get(0))?;
    let with_wage: usize = conn.query_row(
        "SELECT COUNT(*) FROM scraped_jobs WHERE wage IS NOT NULL",
        [],
        |r| r.get(0),
    )?;
    let remote: usize = conn.query_row(
        "SELECT COUNT(*) FROM scraped_jobs WHERE location_requirement = 'Remote'",
        [],
        |r| r.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT source_site, COUNT(*) FROM scraped_jobs GROUP BY source_site ORDER BY 2 DESC",
    )?;
    let by_site = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Stats {
        total,
        with_wage,
        remote,
        by_site,
    })
}

pub fn fetch_recent(conn: &Connection, site: Option<&str>, limit: usize) -> Result<Vec<JobRecord>> {
    let sql = format!(
        "SELECT title, company_name, description, wage, location_requirement,
                experience_level, location, source_url, source_site, posted_at
         FROM scraped_jobs{}
         ORDER BY id DESC LIMIT {}",
        match site {
            Some(_) => " WHERE source_site = ?1",
            None => "",
        },
        limit
    );
    let mut stmt = conn.prepare(&sql)?;

    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<JobRecord> {
        Ok(JobRecord {
            title: row.get(0)?,
            company_name: row.get(1)?,
            description: row.get(2)?,
            wage: row.get(3)?,
            location_requirement: row.get(4)?,
            experience_level: row.get(5)?,
            location: row.get(6)?,
            source_url: row.get(7)?,
            source_site: row.get(8)?,
            posted_at: row.get(9)?,
        })
    }

    let rows = match site {
        Some(s) => stmt.query_map([s], map_row)?.collect::<Result<Vec<_>, _>>()?,
        None => stmt.query_map([], map_row)?.collect::<Result<Vec<_>, _>>()?,
    };
    Ok(rows)
}

// ── Tests ──
