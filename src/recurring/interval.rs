//! How often a recurring expense repeats, and stepping from one occurrence to the next.

use std::fmt::Display;

use rusqlite::{
    ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, Month};

/// How often a recurring expense repeats.
///
/// Intervals are stored as text, so a row may hold a value this version does
/// not understand. Such values are kept as [Interval::Unrecognized] rather than
/// failing the read, and cannot be stepped.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Interval {
    /// Every day.
    Daily,
    /// Every seven days.
    Weekly,
    /// A calendar month of variable length.
    Monthly,
    /// A calendar year, 365 or 366 days.
    Yearly,
    /// A stored value that is not one of the above.
    Unrecognized(String),
}

impl Interval {
    /// The text form used in the database and JSON.
    pub fn as_str(&self) -> &str {
        match self {
            Interval::Daily => "daily",
            Interval::Weekly => "weekly",
            Interval::Monthly => "monthly",
            Interval::Yearly => "yearly",
            Interval::Unrecognized(text) => text,
        }
    }

    /// Whether [step] can advance a date by this interval.
    pub fn is_recognized(&self) -> bool {
        !matches!(self, Interval::Unrecognized(_))
    }
}

impl From<&str> for Interval {
    fn from(value: &str) -> Self {
        match value {
            "daily" => Interval::Daily,
            "weekly" => Interval::Weekly,
            "monthly" => Interval::Monthly,
            "yearly" => Interval::Yearly,
            other => Interval::Unrecognized(other.to_owned()),
        }
    }
}

impl From<String> for Interval {
    fn from(value: String) -> Self {
        Interval::from(value.as_str())
    }
}

impl From<Interval> for String {
    fn from(value: Interval) -> Self {
        match value {
            Interval::Unrecognized(text) => text,
            recognized => recognized.as_str().to_owned(),
        }
    }
}

impl Display for Interval {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl ToSql for Interval {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Interval {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(Interval::from)
    }
}

/// Get the date one `interval` after `date`.
///
/// Months and years are added on the calendar. When the day of month does not
/// exist in the target month, the excess days roll over into the following
/// month, e.g. 31 January plus one month is 3 March (2 March in a leap year),
/// and 29 February plus one year is 1 March. Occurrences of a monthly rule
/// therefore drift to a later day of month after the first short month.
/// Stored ledgers depend on this drift.
///
/// Returns `None` if `interval` is unrecognized or the result would be past
/// the largest representable date.
pub fn step(date: Date, interval: &Interval) -> Option<Date> {
    match interval {
        Interval::Daily => date.checked_add(Duration::days(1)),
        Interval::Weekly => date.checked_add(Duration::weeks(1)),
        Interval::Monthly => add_months(date, 1),
        Interval::Yearly => add_months(date, 12),
        Interval::Unrecognized(_) => None,
    }
}

fn add_months(date: Date, months: i32) -> Option<Date> {
    let month_index = date.year() * 12 + i32::from(u8::from(date.month())) - 1 + months;
    let year = month_index.div_euclid(12);
    let month = Month::try_from((month_index.rem_euclid(12) + 1) as u8).ok()?;

    Date::from_calendar_date(year, month, 1)
        .ok()?
        .checked_add(Duration::days(i64::from(date.day()) - 1))
}
