//! Heuristic rules behind `KeywordClassifier`.
//!
//! Status rules are ordered and first-match-wins: rejection phrasing dominates
//! interview phrasing, which dominates offer phrasing. Anything else is APPLIED.

use std::sync::LazyLock;

use chrono::{DateTime, TimeZone, Utc};
use regex::Regex;

use crate::models::application::ApplicationStatus;

pub const UNKNOWN_COMPANY: &str = "Unknown Company";
pub const UNKNOWN_ROLE: &str = "Unknown Role";

/// Substrings that mark an email as job-related (subject, snippet or sender).
pub const JOB_KEYWORDS: &[&str] = &[
    "application",
    "hiring",
    "interview",
    "recruiting",
    "talent",
    "career",
    "position",
    "job",
    "candidacy",
    "resume",
    "cv",
];

const REJECTION_PHRASES: &[&str] = &[
    "unfortunately",
    "regret to inform",
    "not moving forward",
    "not be proceeding",
];

const INTERVIEW_PHRASES: &[&str] = &["schedule a time", "availability", "phone screen"];

const OFFER_PHRASE: &str = "congratulations! we would like to offer";

static SENDER_NOISE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:recruiting|team|careers|talent|acquisition|hr)\b")
        .expect("sender noise pattern is valid")
});

static ROLE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bfor\s+(.+?)(?:\s+at\s+|\s*[-–|]|$)").expect("role pattern is valid")
});

static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Strips quote characters and surrounding whitespace.
pub fn clean_text(text: &str) -> String {
    text.replace(['\'', '"'], "").trim().to_string()
}

pub fn is_job_related(subject: &str, snippet: &str, from: &str) -> bool {
    let content = format!("{subject} {snippet}").to_lowercase();
    let from = from.to_lowercase();
    JOB_KEYWORDS
        .iter()
        .any(|k| content.contains(k) || from.contains(k))
}

/// Company from the display-name part of a `From` header, minus recruiting noise.
pub fn extract_company(from: &str) -> String {
    let display = from.split('<').next().unwrap_or_default();
    let stripped = SENDER_NOISE.replace_all(display, " ");
    let collapsed = WHITESPACE.replace_all(&stripped, " ");
    let company = collapsed
        .trim_matches(|c: char| c.is_whitespace() || matches!(c, '-' | ',' | '|' | '·' | '@'))
        .to_string();

    if company.chars().count() < 2 {
        UNKNOWN_COMPANY.to_string()
    } else {
        company
    }
}

/// Role from a "for <role> at ..." style subject line.
pub fn extract_role(subject: &str) -> String {
    ROLE_PATTERN
        .captures(subject)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|r| !r.is_empty())
        .unwrap_or_else(|| UNKNOWN_ROLE.to_string())
}

pub fn classify_status(subject: &str, snippet: &str) -> ApplicationStatus {
    let subject = subject.to_lowercase();
    let snippet = snippet.to_lowercase();
    let text = format!("{subject} {snippet}");

    if REJECTION_PHRASES.iter().any(|p| text.contains(p)) {
        ApplicationStatus::Rejected
    } else if subject.contains("interview") || INTERVIEW_PHRASES.iter().any(|p| text.contains(p))
    {
        ApplicationStatus::Interview
    } else if subject.contains("offer") || snippet.contains(OFFER_PHRASE) {
        ApplicationStatus::Offer
    } else {
        ApplicationStatus::Applied
    }
}

/// `Date` header (RFC 2822) first, then provider receive time, then `now`.
pub fn resolve_email_date(
    date_header: Option<&str>,
    internal_date_ms: Option<i64>,
    now: DateTime<Utc>,
) -> DateTime<Utc> {
    date_header
        .and_then(parse_date_header)
        .or_else(|| internal_date_ms.and_then(|ms| Utc.timestamp_millis_opt(ms).single()))
        .unwrap_or(now)
}

fn parse_date_header(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    // Drop a trailing zone comment such as "(UTC)" or "(PDT)".
    let raw = match raw.rfind('(') {
        Some(idx) if raw.ends_with(')') => raw[..idx].trim_end(),
        _ => raw,
    };
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
