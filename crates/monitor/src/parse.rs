//! Permissive parsing of catalog listings and fallback records.
//!
//! Nothing in here fails: malformed input degrades to skipped lines or zero
//! counts.

use std::sync::LazyLock;

use {regex::Regex, serde_json::Value};

use crate::types::SkillRecord;

/// Compile a pattern that is fixed at build time.
#[allow(clippy::expect_used)]
pub(crate) fn static_regex(pattern: &str) -> Regex {
    Regex::new(pattern).expect("static pattern must compile")
}

/// `12,345 downloads`; the count must not continue a decimal or another number.
static PLAIN_DOWNLOADS: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"(?i)(?:^|[^0-9.,])([0-9][0-9,]*)\s*downloads?"));

/// `2.5k downloads`, `1M downloads`.
static COMPACT_DOWNLOADS: LazyLock<Regex> =
    LazyLock::new(|| static_regex(r"(?i)([0-9]+)(?:\.([0-9]+))?\s*([km])\s*downloads?"));

static STANDALONE_INT: LazyLock<Regex> = LazyLock::new(|| static_regex(r"\b[0-9][0-9,]*\b"));

/// Banner fragments the listing command interleaves with its rows.
const SKIPPED_FRAGMENTS: &[&str] = &["fetching latest", "rate limit"];

/// Parse the raw text printed by `explore` into records.
pub fn parse_listing(output: &str) -> Vec<SkillRecord> {
    output.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<SkillRecord> {
    let s = line.trim();
    if s.is_empty() || s.starts_with('-') {
        return None;
    }
    let lower = s.to_lowercase();
    if lower.starts_with("name") || SKIPPED_FRAGMENTS.iter().any(|f| lower.contains(f)) {
        return None;
    }

    let parts: Vec<&str> = s.split_whitespace().collect();
    if parts.len() < 2 {
        return None;
    }

    // Ranked listings put a position ("1." or "12") before the slug.
    let name = if is_rank(parts[0]) { parts[1] } else { parts[0] };
    Some(SkillRecord::new(name, extract_downloads(s), s))
}

fn is_rank(token: &str) -> bool {
    let digits: String = token.chars().filter(|c| *c != '.').collect();
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

/// Best-effort download count of a listing line.
///
/// Tries `N downloads`, then `N[.d]k|m downloads`, then the largest bare
/// integer on the line. Anything unparsable counts as 0.
pub fn extract_downloads(line: &str) -> u64 {
    if let Some(caps) = PLAIN_DOWNLOADS.captures(line) {
        return parse_grouped(&caps[1]).unwrap_or(0);
    }

    if let Some(caps) = COMPACT_DOWNLOADS.captures(line) {
        let multiplier: u64 = if caps[3].eq_ignore_ascii_case("m") {
            1_000_000
        } else {
            1_000
        };
        return scale_compact(&caps[1], caps.get(2).map(|m| m.as_str()), multiplier)
            .unwrap_or(0);
    }

    STANDALONE_INT
        .find_iter(line)
        .filter_map(|m| parse_grouped(m.as_str()))
        .max()
        .unwrap_or(0)
}

/// Parse `1,234` style integers.
fn parse_grouped(digits: &str) -> Option<u64> {
    digits.replace(',', "").parse().ok()
}

/// Integer arithmetic for `whole.frac * multiplier`, truncating below one.
fn scale_compact(whole: &str, frac: Option<&str>, multiplier: u64) -> Option<u64> {
    let whole: u64 = whole.parse().ok()?;
    let mut total = whole.checked_mul(multiplier)?;
    if let Some(frac) = frac {
        // The multiplier has at most six zeros; deeper digits cannot matter.
        let frac: String = frac.chars().take(6).collect();
        let scale = 10u64.pow(frac.chars().count() as u32);
        let part: u64 = frac.parse().ok()?;
        total = total.checked_add(part * multiplier / scale)?;
    }
    Some(total)
}

/// Turn fallback-snapshot items into records.
///
/// Items must be objects with a non-empty `name`; everything else is skipped.
pub fn normalize_records(items: &[Value]) -> Vec<SkillRecord> {
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let name = match obj.get("name")? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if name.is_empty() {
                return None;
            }
            let downloads = obj.get("downloads").map(coerce_count).unwrap_or(0);
            let raw = match obj.get("raw") {
                Some(Value::String(raw)) => raw.clone(),
                _ => format!("{name} | downloads={downloads}"),
            };
            Some(SkillRecord::new(name, downloads, raw))
        })
        .collect()
}

/// Number, numeric string, else 0; negatives count as 0.
pub(crate) fn coerce_count(value: &Value) -> u64 {
    match value {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use {super::*, rstest::rstest, serde_json::json};

    #[rstest]
    #[case("weather  1,234 downloads", 1234)]
    #[case("weather  1 download", 1)]
    #[case("weather  2.5k downloads", 2500)]
    #[case("weather  12K Downloads", 12_000)]
    #[case("weather  1.25M downloads", 1_250_000)]
    #[case("weather  v1.2.0  stars 42  installs 3,100", 3100)]
    #[case("weather-skill forecast helper", 0)]
    #[case("", 0)]
    #[case("huge 99999999999999999999999 downloads", 0)]
    #[case("weather 1.\u{0663}\u{0967}\u{0967}k downloads", 1)]
    #[case("weather \u{0663}\u{0967} downloads", 0)]
    fn downloads(#[case] line: &str, #[case] expected: u64) {
        assert_eq!(extract_downloads(line), expected);
    }

    #[test]
    fn listing_skips_headers_blanks_and_banners() {
        let raw = "\
Name            Downloads   Summary
weather         1,234 downloads  Forecasts

- Fetching latest skills
github-triage   2.5k downloads   Issue triage
Rate limit: 100 requests remaining
notion-sync     87 downloads     Notion export
";
        let records = parse_listing(raw);
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["weather", "github-triage", "notion-sync"]);
        assert_eq!(records[1].downloads, 2500);
        assert_eq!(records[2].raw, "notion-sync     87 downloads     Notion export");
        assert!(!records[0].discovered_at.is_empty());
    }

    #[test]
    fn ranked_rows_use_second_token() {
        let records = parse_listing("1. weather 10 downloads\n12 pdf-tools 3 downloads\n");
        assert_eq!(records[0].name, "weather");
        assert_eq!(records[1].name, "pdf-tools");
    }

    #[test]
    fn single_token_lines_are_skipped() {
        assert!(parse_listing("lonely\n   \n").is_empty());
    }

    #[test]
    fn normalize_applies_defaults() {
        let items = vec![
            json!({"name": "weather", "downloads": 12, "raw": "weather row"}),
            json!({"name": "  pdf-tools  ", "downloads": "oops"}),
            json!({"name": "", "downloads": 5}),
            json!({"downloads": 5}),
            json!("not-an-object"),
            json!({"name": "negative", "downloads": -4}),
        ];
        let records = normalize_records(&items);
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].raw, "weather row");
        assert_eq!(records[1].name, "pdf-tools");
        assert_eq!(records[1].downloads, 0);
        assert_eq!(records[1].raw, "pdf-tools | downloads=0");
        assert_eq!(records[2].downloads, 0);
    }
}
