use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};

use crate::db::JobRecord;
use crate::infer;

static SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").unwrap());

/// Map one intercepted API job object, in whatever shape the source emitted
/// it, to a canonical record. Total: malformed values degrade a field to its
/// default instead of failing the record.
///
/// `detail_url_base` and `search_url` back the source_url fallbacks when the
/// payload carries no usable URL. The search-query form can collide for
/// identical titles, which weakens dedup for those records.
pub fn map_api_job(
    raw: &Map<String, Value>,
    site: &str,
    detail_url_base: &str,
    search_url: &str,
) -> JobRecord {
    let title = first_string(raw, &["title", "name"]).unwrap_or_else(|| "Untitled".to_string());

    let company_name = first_string(raw, &["company_name", "companyName"])
        .or_else(|| {
            raw.get("company")
                .and_then(Value::as_object)
                .and_then(|company| first_string(company, &["name"]))
        })
        .unwrap_or_else(|| "Unknown".to_string());

    let description = first_string(raw, &["description", "body", "details"])
        .unwrap_or_else(|| "No description available.".to_string());

    let wage = match first_value(raw, &["salary", "wage", "compensation"]) {
        Some(value) => format_wage(value),
        None => infer::extract_salary(&description),
    };

    let location = resolve_location(raw);

    let location_requirement = first_string(raw, &["locationRequirement", "work_type"])
        .unwrap_or_else(|| {
            infer::infer_location_requirement(&title, &location, &description).to_string()
        });

    let experience_level = first_string(raw, &["experienceLevel", "experience_level", "seniority"])
        .or_else(|| infer::infer_experience_level(&title, &description).map(str::to_string));

    let source_url = first_string(raw, &["url", "apply_url", "sourceUrl"]).unwrap_or_else(|| {
        let slug = first_string(raw, &["slug"]).unwrap_or_else(|| slugify(&title));
        match first_string(raw, &["id", "_id", "slug"]) {
            Some(id) => format!("{}/{}/{}", detail_url_base, id, slug),
            None => format!("{}{}", search_url, title.replace(' ', "+")),
        }
    });

    let posted_at = first_string(raw, &["postedAt", "posted_at", "created_at"]);

    JobRecord {
        title,
        company_name,
        description,
        wage,
        location_requirement,
        experience_level,
        location,
        source_url,
        source_site: site.to_string(),
        posted_at,
    }
}

// ── Accessors ──

/// First key whose value coerces to a non-empty string. Keys holding empty
/// strings or nulls fall through to the next candidate.
fn first_string(raw: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find_map(value_to_string)
}

/// First key holding a usable value of any shape; nulls and empty strings
/// fall through like missing keys.
fn first_value<'a>(raw: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter()
        .filter_map(|key| raw.get(*key))
        .find(|value| match value {
            Value::Null => false,
            Value::String(s) => !s.trim().is_empty(),
            _ => true,
        })
}

fn value_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// ── Field shaping ──

fn format_wage(value: &Value) -> Option<String> {
    match value {
        // {"min": 100000, "max": 140000, "currency": "USD"} and kin
        Value::Object(range) => {
            let lo = first_string(range, &["min", "low"]);
            let hi = first_string(range, &["max", "high"]);
            if lo.is_none() && hi.is_none() {
                return None;
            }
            let currency =
                first_string(range, &["currency"]).unwrap_or_else(|| "USD".to_string());
            Some(format!(
                "{} {}–{}",
                currency,
                lo.unwrap_or_default(),
                hi.unwrap_or_default()
            ))
        }
        Value::Number(n) => n.as_f64().map(|amount| format!("${}", thousands(amount))),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    }
}

fn resolve_location(raw: &Map<String, Value>) -> String {
    let value = first_value(raw, &["location", "city"]).or_else(|| {
        raw.get("locations")
            .and_then(Value::as_array)
            .and_then(|list| list.first())
    });

    let resolved = match value {
        Some(Value::Object(map)) => first_string(map, &["name", "city"]),
        Some(Value::Array(list)) => {
            let joined = list
                .iter()
                .filter_map(value_to_string)
                .collect::<Vec<_>>()
                .join(", ");
            (!joined.is_empty()).then_some(joined)
        }
        Some(other) => value_to_string(other),
        None => None,
    };
    resolved.unwrap_or_else(|| "Not specified".to_string())
}

/// Lower-case, collapse non-alphanumeric runs to single hyphens, trim.
pub fn slugify(text: &str) -> String {
    SLUG_RE
        .replace_all(&text.to_lowercase(), "-")
        .trim_matches('-')
        .to_string()
}

/// Whole-dollar amount with thousands separators.
fn thousands(amount: f64) -> String {
    let whole = amount.round() as i64;
    let digits = whole.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if whole < 0 {
        out.push('-');
    }
    let first_group = digits.len() % 3;
    if first_group > 0 {
        out.push_str(&digits[..first_group]);
    }
    for (i, chunk) in digits[first_group..].as_bytes().chunks(3).enumerate() {
        if first_group > 0 || i > 0 {
            out.push(',');
        }
        out.push_str(std::str::from_utf8(chunk).unwrap_or(""));
    }
    out
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SITE: &str = "SimplifyJobs";
    const DETAIL: &str = "https://simplify.jobs/p";
    const SEARCH: &str = "https://simplify.jobs/jobs?query=";

    fn map(value: Value) -> JobRecord {
        let raw = value.as_object().unwrap().clone();
        map_api_job(&raw, SITE, DETAIL, SEARCH)
    }

    #[test]
    fn nested_company_and_salary_range() {
        let job = map(json!({
            "title": "Eng",
            "company": {"name": "Acme"},
            "salary": {"min": 100000, "max": 140000, "currency": "USD"},
        }));
        assert_eq!(job.company_name, "Acme");
        let wage = job.wage.unwrap();
        assert!(wage.contains("USD"));
        assert!(wage.contains("100000"));
        assert!(wage.contains("140000"));
    }

    #[test]
    fn numeric_salary_gets_thousands_separators() {
        let job = map(json!({"title": "Eng", "companyName": "Acme", "salary": 120000}));
        assert_eq!(job.wage.as_deref(), Some("$120,000"));
    }

    #[test]
    fn string_salary_kept_verbatim() {
        let job = map(json!({"title": "Eng", "company_name": "Acme", "wage": "$90K-$110K"}));
        assert_eq!(job.wage.as_deref(), Some("$90K-$110K"));
    }

    #[test]
    fn missing_salary_falls_back_to_description() {
        let job = map(json!({
            "title": "Eng",
            "company_name": "Acme",
            "description": "Pays $85,000 per year plus equity.",
        }));
        assert!(job.wage.unwrap().contains("85,000"));
    }

    #[test]
    fn empty_range_object_is_absent() {
        let job = map(json!({
            "title": "Eng",
            "company_name": "Acme",
            "salary": {"currency": "EUR"},
        }));
        assert_eq!(job.wage, None);
    }

    #[test]
    fn defaults_for_missing_fields() {
        let job = map(json!({"irrelevant": true}));
        assert_eq!(job.title, "Untitled");
        assert_eq!(job.company_name, "Unknown");
        assert_eq!(job.description, "No description available.");
        assert_eq!(job.location, "Not specified");
        assert_eq!(job.experience_level, None);
        assert_eq!(job.posted_at, None);
        // no URL and no id: search-query fallback embedding the title
        assert_eq!(job.source_url, "https://simplify.jobs/jobs?query=Untitled");
    }

    #[test]
    fn location_shapes() {
        let from_map = map(json!({
            "title": "Eng", "company_name": "A",
            "location": {"name": "Lisbon"},
        }));
        assert_eq!(from_map.location, "Lisbon");

        let from_list = map(json!({
            "title": "Eng", "company_name": "A",
            "locations": ["Austin, TX"],
        }));
        assert_eq!(from_list.location, "Austin, TX");

        let joined = map(json!({
            "title": "Eng", "company_name": "A",
            "location": ["Austin", "Remote"],
        }));
        assert_eq!(joined.location, "Austin, Remote");
    }

    #[test]
    fn source_supplied_fields_preempt_inference() {
        let job = map(json!({
            "title": "Senior Eng",
            "company_name": "A",
            "work_type": "Flexible",
            "seniority": "L6",
            "description": "remote role",
        }));
        assert_eq!(job.location_requirement, "Flexible");
        assert_eq!(job.experience_level.as_deref(), Some("L6"));
    }

    #[test]
    fn inference_fills_missing_fields() {
        let job = map(json!({
            "title": "Senior Engineer",
            "company_name": "A",
            "description": "Fully remote team.",
        }));
        assert_eq!(job.location_requirement, "Remote");
        assert_eq!(job.experience_level.as_deref(), Some("Senior"));
    }

    #[test]
    fn url_precedence_and_id_template() {
        let direct = map(json!({
            "title": "Eng", "company_name": "A",
            "url": "https://example.com/j/1",
            "id": "abc",
        }));
        assert_eq!(direct.source_url, "https://example.com/j/1");

        let templated = map(json!({
            "title": "Data Engineer II", "company_name": "A",
            "id": "abc-123",
        }));
        assert_eq!(
            templated.source_url,
            "https://simplify.jobs/p/abc-123/data-engineer-ii"
        );

        let with_slug = map(json!({
            "title": "Eng", "company_name": "A",
            "id": "abc", "slug": "custom-slug",
        }));
        assert_eq!(with_slug.source_url, "https://simplify.jobs/p/abc/custom-slug");
    }

    #[test]
    fn numeric_id_is_usable() {
        let job = map(json!({"title": "Eng", "company_name": "A", "id": 42}));
        assert_eq!(job.source_url, "https://simplify.jobs/p/42/eng");
    }

    #[test]
    fn posted_at_key_order() {
        let job = map(json!({
            "title": "Eng", "company_name": "A",
            "created_at": "2025-02-01",
            "posted_at": "2025-03-04",
        }));
        assert_eq!(job.posted_at.as_deref(), Some("2025-03-04"));
    }

    #[test]
    fn slugify_collapses_runs() {
        assert_eq!(slugify("Data Engineer II"), "data-engineer-ii");
        assert_eq!(slugify("C++ / Rust (Core)"), "c-rust-core");
        assert_eq!(slugify("--already--"), "already");
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(thousands(0.0), "0");
        assert_eq!(thousands(999.0), "999");
        assert_eq!(thousands(1000.0), "1,000");
        assert_eq!(thousands(120000.0), "120,000");
        assert_eq!(thousands(1234567.0), "1,234,567");
    }
}
