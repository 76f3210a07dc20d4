//! Pure field normalization and validation.
//!
//! Every function takes raw text and returns either a canonical value or a
//! rejection reason, never both. Rules that vary per deployment (event
//! window, venue roster, date style) are passed in as [`FieldRules`] so the
//! functions stay stateless and testable.
//!
//! Normalization is idempotent: feeding a canonical value back through its
//! validator yields the same canonical value.

pub mod form;

use chrono::NaiveDate;

use crate::config::{BotConfig, DateStyle};
use crate::domain::{EventDate, Place, PlaceChoice, TimeSlot};

/// Wildcard tokens accepted for the desired-side venue.
const WILDCARD_TOKENS: [&str; 2] = ["any", "*"];

/// Deployment-specific validation rules.
#[derive(Debug, Clone)]
pub struct FieldRules {
    /// Enumerated venue roster; numeric shorthand is the 1-based position.
    pub venues: Vec<String>,
    /// Months inside the event window.
    pub allowed_months: Vec<u32>,
    /// Canonical date rendering for this deployment.
    pub date_style: DateStyle,
    /// Calendar year used to validate month/day combinations.
    pub event_year: i32,
}

impl FieldRules {
    /// Extracts the validation rules from the loaded configuration.
    #[must_use]
    pub fn from_config(config: &BotConfig) -> Self {
        Self {
            venues: config.venues.clone(),
            allowed_months: config.allowed_months.clone(),
            date_style: config.date_style,
            event_year: config.event_year,
        }
    }
}

/// Per-field rejection reason. The `Display` form is the human-readable
/// text echoed back to the requester.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    /// Empty after trimming.
    #[error("must not be empty")]
    Empty,

    /// Order number contains a non-digit.
    #[error("may contain only digits")]
    OrderNoNonDigit,

    /// Order number has the wrong length.
    #[error("must be exactly 9 digits, got {0}")]
    OrderNoLength(usize),

    /// Date does not fit the `[[year/]month/]day` shape.
    #[error("unrecognized date \"{0}\"; expected [[year/]month/]day")]
    DateFormat(String),

    /// Month falls outside the event window.
    #[error("month {0} is outside the event window")]
    MonthOutOfWindow(u32),

    /// A bare day is ambiguous when the window spans several months.
    #[error("a day alone is ambiguous; include the month")]
    AmbiguousDay,

    /// The month/day combination is not a real calendar date.
    #[error("\"{0}\" is not a valid calendar date")]
    InvalidCalendarDate(String),

    /// Slot does not fit the `hh:mm~hh:mm` shape.
    #[error("unrecognized time slot \"{0}\"; expected hh:mm~hh:mm")]
    SlotFormat(String),

    /// Hour above 23 or minute above 59.
    #[error("hours must be 0-23 and minutes 0-59")]
    SlotOutOfRange,

    /// Start does not strictly precede end.
    #[error("the slot start must be before its end")]
    SlotOrder,

    /// Venue is neither a roster name nor a valid numeric shorthand.
    #[error("unknown venue \"{0}\"")]
    UnknownPlace(String),

    /// Wildcard used where a concrete venue is required.
    #[error("\"any\" is only accepted for the desired venue")]
    WildcardNotAllowed,

    /// The desired date and slot lists have different lengths.
    #[error("{dates} desired date(s) but {slots} desired time slot(s); the lists must pair up")]
    CountMismatch {
        /// Number of desired dates.
        dates: usize,
        /// Number of desired slots.
        slots: usize,
    },
}

/// Normalizes an order number: strips whitespace, then requires exactly
/// nine ASCII digits.
///
/// # Errors
///
/// Returns a [`FieldError`] when the cleaned value is empty, contains a
/// non-digit, or is not nine digits long.
pub fn normalize_order_no(raw: &str) -> Result<String, FieldError> {
    let cleaned: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if cleaned.is_empty() {
        return Err(FieldError::Empty);
    }
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(FieldError::OrderNoNonDigit);
    }
    if cleaned.len() != 9 {
        return Err(FieldError::OrderNoLength(cleaned.len()));
    }
    Ok(cleaned)
}

/// Normalizes a date written as `[[year/]month/]day` with `/` or `-`
/// separators into the deployment's canonical form.
///
/// A bare day is accepted only when the event window contains exactly one
/// month; otherwise it is ambiguous. The month must fall inside the event
/// window and the month/day pair must be a real calendar date in the
/// event year.
///
/// # Errors
///
/// Returns a [`FieldError`] describing the first rule the input breaks.
pub fn normalize_date(raw: &str, rules: &FieldRules) -> Result<EventDate, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }

    let mut numbers = Vec::with_capacity(3);
    for part in trimmed.split(['/', '-']) {
        let n: u32 = part
            .trim()
            .parse()
            .map_err(|_| FieldError::DateFormat(trimmed.to_string()))?;
        numbers.push(n);
    }

    let (year, month, day) = match numbers.as_slice() {
        [day] => {
            let [month] = rules.allowed_months.as_slice() else {
                return Err(FieldError::AmbiguousDay);
            };
            (None, *month, *day)
        }
        [month, day] => (None, *month, *day),
        [year, month, day] if *year >= 1000 => {
            let year = i32::try_from(*year)
                .map_err(|_| FieldError::DateFormat(trimmed.to_string()))?;
            (Some(year), *month, *day)
        }
        _ => return Err(FieldError::DateFormat(trimmed.to_string())),
    };

    if !rules.allowed_months.contains(&month) {
        return Err(FieldError::MonthOutOfWindow(month));
    }

    let calendar_year = year.unwrap_or(rules.event_year);
    if NaiveDate::from_ymd_opt(calendar_year, month, day).is_none() {
        return Err(FieldError::InvalidCalendarDate(trimmed.to_string()));
    }

    let canonical = match rules.date_style {
        DateStyle::MonthDay => format!("{month}/{day}"),
        DateStyle::YearMonthDay => format!("{calendar_year}/{month}/{day}"),
    };
    Ok(EventDate::from_canonical(canonical))
}

/// Normalizes a time slot written as `hh:mm~hh:mm` or `hh:mm-hh:mm` into
/// zero-padded `HH:MM~HH:MM`. The start must strictly precede the end.
///
/// # Errors
///
/// Returns a [`FieldError`] describing the first rule the input breaks.
pub fn normalize_slot(raw: &str) -> Result<TimeSlot, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }

    let separator = if trimmed.contains('~') { '~' } else { '-' };
    let mut halves = trimmed.split(separator);
    let (Some(start_raw), Some(end_raw), None) = (halves.next(), halves.next(), halves.next())
    else {
        return Err(FieldError::SlotFormat(trimmed.to_string()));
    };

    let start = parse_hour_minute(start_raw, trimmed)?;
    let end = parse_hour_minute(end_raw, trimmed)?;
    if start >= end {
        return Err(FieldError::SlotOrder);
    }

    let (sh, sm) = start;
    let (eh, em) = end;
    Ok(TimeSlot::from_canonical(format!(
        "{sh:02}:{sm:02}~{eh:02}:{em:02}"
    )))
}

/// Parses one `hh:mm` half of a slot.
fn parse_hour_minute(raw: &str, whole: &str) -> Result<(u32, u32), FieldError> {
    let mut parts = raw.trim().split(':');
    let (Some(h_raw), Some(m_raw), None) = (parts.next(), parts.next(), parts.next()) else {
        return Err(FieldError::SlotFormat(whole.to_string()));
    };
    let hour: u32 = h_raw
        .parse()
        .map_err(|_| FieldError::SlotFormat(whole.to_string()))?;
    let minute: u32 = m_raw
        .parse()
        .map_err(|_| FieldError::SlotFormat(whole.to_string()))?;
    if hour > 23 || minute > 59 {
        return Err(FieldError::SlotOutOfRange);
    }
    Ok((hour, minute))
}

/// Resolves a held-side venue: numeric shorthand (1-based roster
/// position) or a roster name, matched ASCII case-insensitively. The
/// wildcard is rejected here.
///
/// # Errors
///
/// Returns a [`FieldError`] for empty input, wildcard tokens, or a value
/// not on the roster.
pub fn resolve_place(raw: &str, rules: &FieldRules) -> Result<Place, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }
    if is_wildcard(trimmed) {
        return Err(FieldError::WildcardNotAllowed);
    }

    if trimmed.chars().all(|c| c.is_ascii_digit()) {
        let position: usize = trimmed
            .parse()
            .map_err(|_| FieldError::UnknownPlace(trimmed.to_string()))?;
        return position
            .checked_sub(1)
            .and_then(|i| rules.venues.get(i))
            .map(|name| Place::from_canonical(name.clone()))
            .ok_or_else(|| FieldError::UnknownPlace(trimmed.to_string()));
    }

    rules
        .venues
        .iter()
        .find(|name| name.eq_ignore_ascii_case(trimmed))
        .map(|name| Place::from_canonical(name.clone()))
        .ok_or_else(|| FieldError::UnknownPlace(trimmed.to_string()))
}

/// Resolves a desired-side venue, where the wildcard is legal.
///
/// # Errors
///
/// Returns a [`FieldError`] for empty input or a non-wildcard value not
/// on the roster.
pub fn resolve_desired_place(raw: &str, rules: &FieldRules) -> Result<PlaceChoice, FieldError> {
    let trimmed = raw.trim();
    if is_wildcard(trimmed) {
        return Ok(PlaceChoice::Any);
    }
    resolve_place(trimmed, rules).map(PlaceChoice::Exactly)
}

/// Returns `true` for a desired-side wildcard token.
fn is_wildcard(trimmed: &str) -> bool {
    WILDCARD_TOKENS
        .iter()
        .any(|t| t.eq_ignore_ascii_case(trimmed))
}

/// Splits a multi-value field on ASCII and CJK list separators, dropping
/// empty elements.
#[must_use]
pub fn split_list(raw: &str) -> Vec<&str> {
    raw.split([',', '，', '、'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Normalizes a comma-separated list of dates; every element must be
/// valid on its own.
///
/// # Errors
///
/// Returns the first element's [`FieldError`], or [`FieldError::Empty`]
/// for an empty list.
pub fn normalize_date_list(raw: &str, rules: &FieldRules) -> Result<Vec<EventDate>, FieldError> {
    let elements = split_list(raw);
    if elements.is_empty() {
        return Err(FieldError::Empty);
    }
    elements
        .into_iter()
        .map(|e| normalize_date(e, rules))
        .collect()
}

/// Normalizes a comma-separated list of time slots; every element must be
/// valid on its own.
///
/// # Errors
///
/// Returns the first element's [`FieldError`], or [`FieldError::Empty`]
/// for an empty list.
pub fn normalize_slot_list(raw: &str) -> Result<Vec<TimeSlot>, FieldError> {
    let elements = split_list(raw);
    if elements.is_empty() {
        return Err(FieldError::Empty);
    }
    elements.into_iter().map(normalize_slot).collect()
}

/// Checks that the desired date and slot lists pair 1:1 by position.
///
/// # Errors
///
/// Returns [`FieldError::CountMismatch`] when the cardinalities differ.
pub const fn check_paired(dates: usize, slots: usize) -> Result<(), FieldError> {
    if dates == slots {
        Ok(())
    } else {
        Err(FieldError::CountMismatch { dates, slots })
    }
}

/// Normalizes a free-text field: non-empty after trimming, kept verbatim
/// otherwise.
///
/// # Errors
///
/// Returns [`FieldError::Empty`] when nothing remains after trimming.
pub fn normalize_text(raw: &str) -> Result<String, FieldError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(FieldError::Empty);
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn rules() -> FieldRules {
        FieldRules {
            venues: vec![
                "Hall A".to_string(),
                "Hall B".to_string(),
                "Hall C".to_string(),
            ],
            allowed_months: vec![12, 1],
            date_style: DateStyle::MonthDay,
            event_year: 2026,
        }
    }

    #[test]
    fn order_no_accepts_exactly_nine_digits() {
        assert_eq!(normalize_order_no("123456789").ok().as_deref(), Some("123456789"));
        assert_eq!(normalize_order_no(" 123 456 789 ").ok().as_deref(), Some("123456789"));
        assert_eq!(normalize_order_no("12345"), Err(FieldError::OrderNoLength(5)));
        assert_eq!(normalize_order_no("1234567890"), Err(FieldError::OrderNoLength(10)));
        assert_eq!(normalize_order_no("12345678a"), Err(FieldError::OrderNoNonDigit));
        assert_eq!(normalize_order_no("   "), Err(FieldError::Empty));
    }

    #[test]
    fn date_accepts_month_day_and_dash_separator() {
        let r = rules();
        assert_eq!(normalize_date("12/25", &r).ok().map(|d| d.to_string()), Some("12/25".to_string()));
        assert_eq!(normalize_date("12-25", &r).ok().map(|d| d.to_string()), Some("12/25".to_string()));
        assert_eq!(normalize_date(" 1/05 ", &r).ok().map(|d| d.to_string()), Some("1/5".to_string()));
    }

    #[test]
    fn date_with_year_collapses_to_month_day_style() {
        let r = rules();
        assert_eq!(
            normalize_date("2026/12/25", &r).ok().map(|d| d.to_string()),
            Some("12/25".to_string())
        );
    }

    #[test]
    fn date_year_style_keeps_the_year() {
        let r = FieldRules {
            date_style: DateStyle::YearMonthDay,
            ..rules()
        };
        assert_eq!(
            normalize_date("12/25", &r).ok().map(|d| d.to_string()),
            Some("2026/12/25".to_string())
        );
        assert_eq!(
            normalize_date("2027/1/2", &r).ok().map(|d| d.to_string()),
            Some("2027/1/2".to_string())
        );
    }

    #[test]
    fn date_rejects_month_outside_window() {
        assert_eq!(
            normalize_date("7/25", &rules()),
            Err(FieldError::MonthOutOfWindow(7))
        );
    }

    #[test]
    fn date_rejects_impossible_calendar_dates() {
        assert_eq!(
            normalize_date("12/32", &rules()),
            Err(FieldError::InvalidCalendarDate("12/32".to_string()))
        );
        assert_eq!(
            normalize_date("1/32", &rules()),
            Err(FieldError::InvalidCalendarDate("1/32".to_string()))
        );
    }

    #[test]
    fn bare_day_needs_a_single_month_window() {
        assert_eq!(normalize_date("25", &rules()), Err(FieldError::AmbiguousDay));

        let single = FieldRules {
            allowed_months: vec![12],
            ..rules()
        };
        assert_eq!(
            normalize_date("25", &single).ok().map(|d| d.to_string()),
            Some("12/25".to_string())
        );
    }

    #[test]
    fn date_rejects_garbage() {
        assert_eq!(
            normalize_date("christmas", &rules()),
            Err(FieldError::DateFormat("christmas".to_string()))
        );
        assert_eq!(
            normalize_date("12/25/26/07", &rules()),
            Err(FieldError::DateFormat("12/25/26/07".to_string()))
        );
    }

    #[test]
    fn slot_normalizes_to_padded_tilde_form() {
        assert_eq!(
            normalize_slot("14:00~15:00").ok().map(|s| s.to_string()),
            Some("14:00~15:00".to_string())
        );
        assert_eq!(
            normalize_slot("9:5-10:30").ok().map(|s| s.to_string()),
            Some("09:05~10:30".to_string())
        );
    }

    #[test]
    fn slot_requires_start_before_end() {
        assert_eq!(normalize_slot("15:00~14:00"), Err(FieldError::SlotOrder));
        assert_eq!(normalize_slot("14:00~14:00"), Err(FieldError::SlotOrder));
        // comparison is on (hour, minute), not on the raw strings
        assert_eq!(
            normalize_slot("9:30~10:00").ok().map(|s| s.to_string()),
            Some("09:30~10:00".to_string())
        );
    }

    #[test]
    fn slot_rejects_out_of_range_and_garbage() {
        assert_eq!(normalize_slot("24:00~25:00"), Err(FieldError::SlotOutOfRange));
        assert_eq!(normalize_slot("14:60~15:00"), Err(FieldError::SlotOutOfRange));
        assert_eq!(
            normalize_slot("afternoon"),
            Err(FieldError::SlotFormat("afternoon".to_string()))
        );
        assert_eq!(
            normalize_slot("14:00"),
            Err(FieldError::SlotFormat("14:00".to_string()))
        );
    }

    #[test]
    fn place_resolves_shorthand_and_name() {
        let r = rules();
        assert_eq!(
            resolve_place("2", &r).ok().map(|p| p.to_string()),
            Some("Hall B".to_string())
        );
        assert_eq!(
            resolve_place("hall a", &r).ok().map(|p| p.to_string()),
            Some("Hall A".to_string())
        );
        assert_eq!(
            resolve_place("0", &r),
            Err(FieldError::UnknownPlace("0".to_string()))
        );
        assert_eq!(
            resolve_place("4", &r),
            Err(FieldError::UnknownPlace("4".to_string()))
        );
        assert_eq!(
            resolve_place("Stadium", &r),
            Err(FieldError::UnknownPlace("Stadium".to_string()))
        );
    }

    #[test]
    fn wildcard_is_desired_side_only() {
        let r = rules();
        assert_eq!(resolve_place("any", &r), Err(FieldError::WildcardNotAllowed));
        assert_eq!(resolve_place("*", &r), Err(FieldError::WildcardNotAllowed));
        assert_eq!(resolve_desired_place("ANY", &r), Ok(PlaceChoice::Any));
        assert_eq!(
            resolve_desired_place("Hall C", &r),
            Ok(PlaceChoice::Exactly(Place::from_canonical("Hall C")))
        );
    }

    #[test]
    fn lists_split_on_ascii_and_cjk_separators() {
        assert_eq!(split_list("12/25,12/26"), vec!["12/25", "12/26"]);
        assert_eq!(split_list("12/25、12/26，12/27"), vec!["12/25", "12/26", "12/27"]);
        assert_eq!(split_list(" , "), Vec::<&str>::new());
    }

    #[test]
    fn date_list_validates_each_element() {
        let r = rules();
        let dates = normalize_date_list("12/25, 12/26", &r);
        assert_eq!(
            dates.ok().map(|v| v.iter().map(ToString::to_string).collect::<Vec<_>>()),
            Some(vec!["12/25".to_string(), "12/26".to_string()])
        );
        assert_eq!(
            normalize_date_list("12/25, 7/4", &r),
            Err(FieldError::MonthOutOfWindow(7))
        );
    }

    #[test]
    fn count_mismatch_is_a_list_level_error() {
        assert_eq!(check_paired(2, 2), Ok(()));
        assert_eq!(
            check_paired(2, 1),
            Err(FieldError::CountMismatch { dates: 2, slots: 1 })
        );
    }

    #[test]
    fn free_text_requires_substance() {
        assert_eq!(normalize_text("  Alice  ").ok().as_deref(), Some("Alice"));
        assert_eq!(normalize_text("   "), Err(FieldError::Empty));
    }

    #[test]
    fn normalization_is_idempotent() {
        let r = rules();
        for raw in ["123 456 789", "12-25", "2026/12/31", "25"] {
            if let Ok(once) = normalize_order_no(raw) {
                assert_eq!(normalize_order_no(&once), Ok(once.clone()));
            }
            if let Ok(once) = normalize_date(raw, &r) {
                assert_eq!(normalize_date(once.as_str(), &r), Ok(once.clone()));
            }
        }
        for raw in ["9:5-10:30", "14:00~15:00"] {
            let Ok(once) = normalize_slot(raw) else {
                panic!("slot {raw} should validate");
            };
            assert_eq!(normalize_slot(once.as_str()), Ok(once.clone()));
        }
        for raw in ["2", "hall b"] {
            let Ok(once) = resolve_place(raw, &r) else {
                panic!("place {raw} should resolve");
            };
            assert_eq!(resolve_place(once.as_str(), &r), Ok(once.clone()));
        }
    }
}
