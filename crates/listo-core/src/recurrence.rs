//! Pure recurrence engine.
//!
//! A [`RecurrenceRule`] is rendered to an RFC 5545 rule string and evaluated
//! with the `rrule` crate. All functions here are deterministic and free of
//! side effects; the lifecycle managers own the scheduling that results.

use chrono::{DateTime, Utc};
use rrule::RRuleSet;

use crate::error::CoreError;
use crate::models::{Frequency, RecurrenceRule};

/// BYDAY tokens indexed by weekday number (0=Sunday .. 6=Saturday).
const BYDAY_TOKENS: [&str; 7] = ["SU", "MO", "TU", "WE", "TH", "FR", "SA"];

/// Checks a rule for values the engine cannot evaluate.
pub fn validate(rule: &RecurrenceRule) -> Result<(), CoreError> {
    if rule.interval == 0 {
        return Err(CoreError::InvalidRecurrence(
            "interval must be at least 1".to_string(),
        ));
    }
    if let Some(weekdays) = &rule.weekdays {
        if weekdays.is_empty() {
            return Err(CoreError::InvalidRecurrence(
                "weekday set must not be empty".to_string(),
            ));
        }
        if let Some(&day) = weekdays.iter().find(|&&d| d > 6) {
            return Err(CoreError::InvalidRecurrence(format!(
                "weekday {} out of range 0-6",
                day
            )));
        }
    }
    Ok(())
}

/// Renders a rule to its RFC 5545 RRULE property value,
/// e.g. `FREQ=WEEKLY;INTERVAL=2;BYDAY=MO,WE`.
pub fn to_rrule(rule: &RecurrenceRule) -> Result<String, CoreError> {
    validate(rule)?;

    let freq = match rule.frequency {
        Frequency::Daily => "DAILY",
        Frequency::Weekly => "WEEKLY",
        Frequency::Monthly => "MONTHLY",
        Frequency::Yearly => "YEARLY",
    };

    let mut out = format!("FREQ={};INTERVAL={}", freq, rule.interval);
    if let Some(weekdays) = &rule.weekdays {
        let days = weekdays
            .iter()
            .map(|&d| BYDAY_TOKENS[d as usize])
            .collect::<Vec<_>>()
            .join(",");
        out.push_str(";BYDAY=");
        out.push_str(&days);
    }
    Ok(out)
}

/// Computes the first `count` occurrence instants of `rule` starting at
/// `start`. The result is ordered; `start` itself is occurrence 0 whenever it
/// matches the rule. Finite rules may yield fewer than `count` instants.
pub fn next_occurrences(
    start: DateTime<Utc>,
    rule: &RecurrenceRule,
    count: usize,
) -> Result<Vec<DateTime<Utc>>, CoreError> {
    if count == 0 {
        return Ok(Vec::new());
    }

    let rrule_string = format!(
        "DTSTART:{}\nRRULE:{}",
        start.format("%Y%m%dT%H%M%SZ"),
        to_rrule(rule)?
    );

    let rrule_set = rrule_string
        .parse::<RRuleSet>()
        .map_err(|e| CoreError::InvalidRecurrence(format!("{}: {}", rrule_string, e)))?;

    let limit = count.min(u16::MAX as usize) as u16;
    let (occurrences, _) = rrule_set.all(limit);

    Ok(occurrences
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .collect())
}

/// Convenience wrapper used by the firing protocol: the occurrence after
/// `start`, if the rule produces one.
pub fn occurrence_after(
    start: DateTime<Utc>,
    rule: &RecurrenceRule,
) -> Result<Option<DateTime<Utc>>, CoreError> {
    let occurrences = next_occurrences(start, rule, 2)?;
    Ok(occurrences.get(1).copied())
}
