use scraper::{Html, Selector};
use tracing::debug;

use super::element_text;

const LOCATION_REQ_KEYWORDS: &[&str] = &["remote", "in person", "hybrid", "on-site"];
const LEVEL_TOKENS: &[&str] = &[
    "intern", "junior", "mid", "senior", "lead", "entry", "expert", "staff",
];

/// Fields recovered from one rendered job card in the client-side grid.
#[derive(Debug, Clone)]
pub struct CardFields {
    pub title: String,
    pub company: String,
    pub wage: Option<String>,
    pub location: String,
    pub location_requirement: Option<String>,
    pub experience_level: Option<String>,
}

/// Parse the rendered card grid: every clickable container holding a
/// heading is a candidate card. Heuristic field recovery; a card without a
/// heading text is dropped.
pub fn parse(html: &str) -> Vec<CardFields> {
    let document = Html::parse_document(html);
    let button_sel = Selector::parse("button").unwrap();
    let heading_sel = Selector::parse("h3").unwrap();
    let span_sel = Selector::parse("span").unwrap();
    let para_sel = Selector::parse("p").unwrap();

    let mut cards = Vec::new();
    for (idx, card) in document
        .select(&button_sel)
        .filter(|el| el.select(&heading_sel).next().is_some())
        .enumerate()
    {
        let title = card
            .select(&heading_sel)
            .next()
            .map(element_text)
            .unwrap_or_default();
        if title.is_empty() {
            debug!("card {} has an empty heading, skipping", idx);
            continue;
        }

        // Company: first span that is not the title, a logo alt-text stub,
        // or a currency figure.
        let company = card
            .select(&span_sel)
            .map(element_text)
            .find(|text| {
                !text.is_empty() && *text != title && text.len() > 1 && !text.starts_with('$')
            })
            .unwrap_or_else(|| "Unknown".to_string());

        let paragraphs: Vec<String> = card.select(&para_sel).map(element_text).collect();

        let wage = paragraphs
            .iter()
            .find(|text| text.contains("/yr") || text.contains("/hr") || text.contains('$'))
            .cloned();

        let mut location = "Not specified".to_string();
        let mut location_requirement = None;
        for text in &paragraphs {
            let lower = text.to_lowercase();
            if LOCATION_REQ_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                location_requirement = Some(text.clone());
            } else if text.contains(',') && text.len() < 80 && !text.contains('$') {
                location = text.clone();
            }
        }

        let experience_level = paragraphs
            .iter()
            .find(|text| LEVEL_TOKENS.contains(&text.to_lowercase().as_str()))
            .map(|text| capitalize(text));

        cards.push(CardFields {
            title,
            company,
            wage,
            location,
            location_requirement,
            experience_level,
        });
    }
    cards
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/simplify_cards.html").unwrap()
    }

    #[test]
    fn parses_cards_with_headings() {
        let cards = parse(&fixture());
        // fixture has 3 buttons with h3; one heading is empty and is dropped
        assert_eq!(cards.len(), 2);
        assert_eq!(cards[0].title, "Frontend Engineer");
    }

    #[test]
    fn company_skips_title_and_currency_spans() {
        let cards = parse(&fixture());
        assert_eq!(cards[0].company, "Acme Corp");
    }

    #[test]
    fn wage_from_salary_paragraph() {
        let cards = parse(&fixture());
        assert_eq!(cards[0].wage.as_deref(), Some("$120K/yr - $150K/yr"));
    }

    #[test]
    fn location_and_requirement_split() {
        let cards = parse(&fixture());
        assert_eq!(cards[0].location, "San Francisco, CA");
        assert_eq!(cards[0].location_requirement.as_deref(), Some("Remote in USA"));
    }

    #[test]
    fn experience_level_exact_token_only() {
        let cards = parse(&fixture());
        assert_eq!(cards[0].experience_level.as_deref(), Some("Senior"));
        // "Senior leadership offsite" is not an exact token
        assert_eq!(cards[1].experience_level, None);
    }

    #[test]
    fn sparse_card_degrades_to_defaults() {
        let cards = parse(&fixture());
        let sparse = &cards[1];
        assert_eq!(sparse.company, "Unknown");
        assert_eq!(sparse.wage, None);
        assert_eq!(sparse.location, "Not specified");
    }

    #[test]
    fn page_without_buttons_yields_nothing() {
        assert!(parse("<div><h3>Not clickable</h3></div>").is_empty());
    }
}
