//! Local calendar dates: parsing, day arithmetic, due buckets and labels.
//!
//! Due dates are `YYYY-MM-DD` strings meaning a day on the user's local
//! calendar. They are parsed straight into [`NaiveDate`] and never pass
//! through a UTC instant, so a date cannot shift by a day for users west of
//! UTC near midnight. All arithmetic is whole calendar days against an
//! explicit `today`.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use serde::{Serialize, Serializer};

/// Error returned when a due date string is not a `YYYY-MM-DD` calendar date.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid date '{input}': expected YYYY-MM-DD")]
pub struct DateParseError {
    pub input: String,
}

/// Parse a `YYYY-MM-DD` string as a local calendar date.
///
/// # Errors
///
/// Returns [`DateParseError`] if the input is not a valid calendar date.
pub fn parse_local_date(s: &str) -> Result<NaiveDate, DateParseError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|_| DateParseError {
        input: s.to_string(),
    })
}

/// Today's date on the local calendar.
#[must_use]
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Whole calendar days from `today` to `date` (negative when past).
#[must_use]
pub fn days_until(date: NaiveDate, today: NaiveDate) -> i64 {
    (date - today).num_days()
}

/// Coarse due-date category used for filtering and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DueBucket {
    PastDue,
    DueToday,
    DueTomorrow,
    /// Due in 2 to 7 days.
    DueIn(u8),
    /// Due in 8 to 14 days.
    DueWeeks,
    DueDistant,
}

impl DueBucket {
    /// Stable filter key (`past_due`, `due_today`, `due_3`, `due_weeks`, ...).
    #[must_use]
    pub fn key(self) -> Cow<'static, str> {
        match self {
            Self::PastDue => Cow::Borrowed("past_due"),
            Self::DueToday => Cow::Borrowed("due_today"),
            Self::DueTomorrow => Cow::Borrowed("due_tomorrow"),
            Self::DueIn(n) => Cow::Owned(format!("due_{n}")),
            Self::DueWeeks => Cow::Borrowed("due_weeks"),
            Self::DueDistant => Cow::Borrowed("due_distant"),
        }
    }

    /// `due_tomorrow` through `due_7`.
    #[must_use]
    pub const fn is_this_week(self) -> bool {
        matches!(self, Self::DueTomorrow | Self::DueIn(_))
    }
}

/// Bucket a date relative to `today`.
#[must_use]
pub fn classify(date: NaiveDate, today: NaiveDate) -> DueBucket {
    match days_until(date, today) {
        d if d < 0 => DueBucket::PastDue,
        0 => DueBucket::DueToday,
        1 => DueBucket::DueTomorrow,
        // Guarded range, so the cast cannot truncate.
        d @ 2..=7 => DueBucket::DueIn(u8::try_from(d).unwrap_or(7)),
        8..=14 => DueBucket::DueWeeks,
        _ => DueBucket::DueDistant,
    }
}

/// Human label for a due date.
///
/// Completed entities always get the absolute `"Mon D"` form so that finished
/// work never reads as overdue.
#[must_use]
pub fn format_due(date: NaiveDate, today: NaiveDate, is_completed: bool) -> String {
    if is_completed {
        return format_absolute(date);
    }
    match days_until(date, today) {
        d if d < -1 => format!("{} days overdue", -d),
        -1 => "Yesterday".to_string(),
        0 => "Today".to_string(),
        1 => "Tomorrow".to_string(),
        d @ 2..=6 => format!("{d} days"),
        7..=13 => "1 week".to_string(),
        d @ 14..=29 => format!("{} weeks", d / 7),
        _ => format_absolute(date),
    }
}

/// `"Feb 10"`.
#[must_use]
pub fn format_absolute(date: NaiveDate) -> String {
    date.format("%b %-d").to_string()
}

impl fmt::Display for DueBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

impl Serialize for DueBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.key())
    }
}

impl FromStr for DueBucket {
    type Err = crate::model::item::ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "past_due" => Ok(Self::PastDue),
            "due_today" => Ok(Self::DueToday),
            "due_tomorrow" => Ok(Self::DueTomorrow),
            "due_weeks" => Ok(Self::DueWeeks),
            "due_distant" => Ok(Self::DueDistant),
            other => other
                .strip_prefix("due_")
                .and_then(|n| n.parse::<u8>().ok())
                .filter(|n| (2..=7).contains(n))
                .map(Self::DueIn)
                .ok_or_else(|| crate::model::item::ParseEnumError {
                    expected: "due bucket",
                    got: s.to_string(),
                }),
        }
    }
}
