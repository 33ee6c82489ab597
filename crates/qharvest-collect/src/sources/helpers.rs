//! Extraction helpers shared by the collectors.

use chrono::{DateTime, Utc};
use qharvest_core::{CollectedAnswer, CollectionConfig};
use serde_json::Value;

/// Policy: an unparsable or missing source timestamp becomes "now" instead
/// of failing the item. Every timestamp helper below funnels through this.
fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Converts epoch seconds to a timestamp, substituting the current time for
/// missing, zero, or out-of-range values.
pub(super) fn epoch_secs_or_now(secs: Option<i64>) -> DateTime<Utc> {
    secs.filter(|s| *s > 0)
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .unwrap_or_else(now)
}

/// Parses the social-feed timestamp format `Mon Oct 10 10:00:00 +0800 2024`,
/// substituting the current time when the string does not parse.
pub(super) fn social_time_or_now(raw: Option<&str>) -> DateTime<Utc> {
    raw.and_then(|s| DateTime::parse_from_str(s, "%a %b %d %H:%M:%S %z %Y").ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(now)
}

/// Best-effort timestamp from an arbitrary JSON value: integer or digit
/// string epoch seconds, RFC 3339, or the social-feed format; anything else
/// becomes "now".
pub(super) fn flexible_time_or_now(value: Option<&Value>) -> DateTime<Utc> {
    let Some(value) = value else {
        return now();
    };
    if let Some(secs) = value.as_i64() {
        return epoch_secs_or_now(Some(secs));
    }
    if let Some(raw) = value.as_str() {
        if raw.chars().all(|c| c.is_ascii_digit()) && !raw.is_empty() {
            return epoch_secs_or_now(raw.parse::<i64>().ok());
        }
        if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
            return t.with_timezone(&Utc);
        }
        if let Ok(t) = DateTime::parse_from_str(raw, "%a %b %d %H:%M:%S %z %Y") {
            return t.with_timezone(&Utc);
        }
    }
    now()
}

/// Source-side ids arrive as strings or numbers depending on the platform
/// and endpoint; normalize to a non-empty string.
pub(super) fn json_id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Clamps a possibly-missing, possibly-negative count into `u32`.
pub(super) fn count_u32(value: Option<i64>) -> u32 {
    u32::try_from(value.unwrap_or(0).clamp(0, i64::from(u32::MAX))).unwrap_or(0)
}

/// Sorts retained answers by upvotes descending, then caps at the
/// per-question limit from the config.
pub(super) fn finalize_answers(
    mut answers: Vec<CollectedAnswer>,
    config: &CollectionConfig,
) -> Vec<CollectedAnswer> {
    answers.sort_by(|a, b| b.upvotes.cmp(&a.upvotes));
    answers.truncate(config.max_answers_per_question);
    answers
}
