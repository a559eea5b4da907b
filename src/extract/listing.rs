use scraper::{ElementRef, Html, Selector};
use tracing::debug;
use url::Url;

use super::element_text;

/// Minimal metadata scraped from one listing-page entry, before the detail
/// page fills in the description.
#[derive(Debug, Clone)]
pub struct ListingCard {
    pub title: String,
    pub company: String,
    pub location: String,
    pub source_url: String,
    pub posted_at: Option<String>,
}

/// Parse a server-rendered listing page (ol.list-recent-jobs) into cards.
/// The heading link is the only hard requirement per item; everything else
/// degrades to a default. Malformed items are skipped, never fatal.
pub fn parse(html: &str, base_url: &str) -> Vec<ListingCard> {
    let document = Html::parse_document(html);
    let list_sel = Selector::parse("ol.list-recent-jobs > li").unwrap();
    let title_sel = Selector::parse("h2.listing-company a").unwrap();
    let company_sel = Selector::parse("span.listing-company-name").unwrap();
    let location_sel = Selector::parse("span.listing-location a").unwrap();
    let posted_sel = Selector::parse("span.listing-posted time").unwrap();

    let items: Vec<_> = document.select(&list_sel).collect();
    if items.is_empty() {
        debug!("no ol.list-recent-jobs entries in page");
        return Vec::new();
    }

    let mut cards = Vec::new();
    for (idx, item) in items.into_iter().enumerate() {
        let Some(title_link) = item.select(&title_sel).next() else {
            debug!("listing item {} has no title link, skipping", idx);
            continue;
        };
        let title = element_text(title_link);
        if title.is_empty() {
            debug!("listing item {} has an empty title, skipping", idx);
            continue;
        }
        let href = title_link.value().attr("href").unwrap_or_default();
        let source_url = resolve_url(base_url, href);

        let company = item
            .select(&company_sel)
            .next()
            .map(company_name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| "Unknown".to_string());

        let location = item
            .select(&location_sel)
            .next()
            .map(element_text)
            .filter(|loc| !loc.is_empty())
            .unwrap_or_else(|| "Not specified".to_string());

        let posted_at = item.select(&posted_sel).next().and_then(|time| {
            time.value()
                .attr("datetime")
                .map(str::to_string)
                .filter(|dt| !dt.is_empty())
                .or_else(|| Some(element_text(time)).filter(|t| !t.is_empty()))
        });

        cards.push(ListingCard {
            title,
            company,
            location,
            source_url,
            posted_at,
        });
    }
    cards
}

/// The company span carries the title link as a child ("<a>Title</a> — Co"),
/// so the company name is the span text minus every child element's text.
fn company_name(span: ElementRef) -> String {
    let mut name: String = span.text().collect();
    for child in span.children().filter_map(ElementRef::wrap) {
        let child_text: String = child.text().collect();
        if !child_text.is_empty() {
            name = name.replacen(&child_text, "", 1);
        }
    }
    name.trim()
        .trim_matches(|c| c == '—' || c == '–' || c == '-')
        .trim()
        .to_string()
}

fn resolve_url(base: &str, href: &str) -> String {
    match Url::parse(base).and_then(|b| b.join(href)) {
        Ok(url) => url.to_string(),
        Err(_) => format!("{}{}", base, href),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/python_org_listing.html").unwrap()
    }

    #[test]
    fn parses_wellformed_items_and_skips_broken_ones() {
        let cards = parse(&fixture(), "https://www.python.org");
        // fixture has 4 items; one has no title link and must be skipped
        assert_eq!(cards.len(), 3);
    }

    #[test]
    fn resolves_relative_urls_against_base() {
        let cards = parse(&fixture(), "https://www.python.org");
        assert_eq!(cards[0].source_url, "https://www.python.org/jobs/7711/");
        // absolute hrefs pass through untouched
        assert_eq!(cards[2].source_url, "https://jobs.example.com/posting/42");
    }

    #[test]
    fn company_is_span_text_minus_title_link() {
        let cards = parse(&fixture(), "https://www.python.org");
        assert_eq!(cards[0].company, "Nebula Analytics");
    }

    #[test]
    fn fields_default_when_absent() {
        let cards = parse(&fixture(), "https://www.python.org");
        let sparse = &cards[1];
        assert_eq!(sparse.company, "Unknown");
        assert_eq!(sparse.location, "Not specified");
        assert_eq!(sparse.posted_at, None);
    }

    #[test]
    fn posted_at_prefers_machine_readable_datetime() {
        let cards = parse(&fixture(), "https://www.python.org");
        assert_eq!(cards[0].posted_at.as_deref(), Some("2025-07-18"));
        // third card's <time> has no datetime attribute, display text is used
        assert_eq!(cards[2].posted_at.as_deref(), Some("18 July 2025"));
    }

    #[test]
    fn empty_page_yields_nothing() {
        assert!(parse("<html><body></body></html>", "https://www.python.org").is_empty());
    }
}
