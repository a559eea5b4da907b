use std::sync::LazyLock;

use regex::Regex;

static SALARY_RES: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // $120,000 - $150,000 per year
        Regex::new(
            r"(?i)\$[\d,]+(?:\s*(?:-|–|—|to)+\s*\$?[\d,]+)?(?:\s*(?:per\s+)?(?:year|yr|annum|annually|hour|hr|month|mo))?",
        )
        .unwrap(),
        // USD 90,000 - 120,000
        Regex::new(r"(?i)(?:USD|EUR|GBP)\s*[\d,]+(?:\s*(?:-|–|—|to)+\s*[\d,]+)?").unwrap(),
        // 90,000 USD
        Regex::new(r"(?i)[\d,]+\s*(?:USD|EUR|GBP)").unwrap(),
    ]
});

/// Ordered experience rules. Multiple keywords can co-occur ("senior staff"),
/// so the first matching rule wins.
static LEVEL_RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    vec![
        (Regex::new(r"\b(?:intern|internship)\b").unwrap(), "Intern"),
        (Regex::new(r"\bjunior\b|entry[\s-]?level").unwrap(), "Junior"),
        (Regex::new(r"\bmid[\s-]?level\b|\bintermediate\b").unwrap(), "Mid"),
        (Regex::new(r"\bsenior\b|\bsr\.?\b").unwrap(), "Senior"),
        (Regex::new(r"\b(?:lead|principal|staff)\b").unwrap(), "Lead"),
        (
            Regex::new(r"\b(?:director|head of|vp|vice president)\b").unwrap(),
            "Director",
        ),
    ]
});

/// Best-effort extraction of a salary/wage string from free text.
/// Returns the first matched substring verbatim, not parsed into bounds.
pub fn extract_salary(text: &str) -> Option<String> {
    SALARY_RES
        .iter()
        .find_map(|re| re.find(text))
        .map(|m| m.as_str().trim().to_string())
}

/// Keyword-match an experience level from title and description.
pub fn infer_experience_level(title: &str, description: &str) -> Option<&'static str> {
    let combined = format!("{} {}", title, description).to_lowercase();
    LEVEL_RULES
        .iter()
        .find(|(re, _)| re.is_match(&combined))
        .map(|(_, level)| *level)
}

/// Decide Remote / Hybrid / On-site from available text. Always returns a value.
pub fn infer_location_requirement(title: &str, location: &str, description: &str) -> &'static str {
    let combined = format!("{} {} {}", title, location, description).to_lowercase();
    if combined.contains("remote") || combined.contains("telecommut") {
        "Remote"
    } else if combined.contains("hybrid") {
        "Hybrid"
    } else {
        "On-site"
    }
}

// ── Tests ──
