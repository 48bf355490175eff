//! Local time, used as the cutover point for recurring expense changes.

use time::{Date, OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::Error;

/// Get the UTC offset of `canonical_timezone` at the instant `at`, e.g. "Pacific/Auckland".
pub fn get_local_offset(canonical_timezone: &str, at: &OffsetDateTime) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone).map(|tz| tz.get_offset_utc(at).to_utc())
}

/// The date in `canonical_timezone` at the instant `now`.
fn local_date(canonical_timezone: &str, now: OffsetDateTime) -> Result<Date, Error> {
    let Some(offset) = get_local_offset(canonical_timezone, &now) else {
        tracing::error!("Invalid timezone {canonical_timezone}");
        return Err(Error::InvalidTimezoneError(canonical_timezone.to_owned()));
    };

    Ok(now.to_offset(offset).date())
}

/// The source of "now" for the ledger.
///
/// Entries dated on or before [LedgerClock::today] have already happened,
/// entries dated after it are in the future.
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerClock {
    /// Read the wall clock in a canonical timezone, e.g. "Pacific/Auckland".
    Local(String),
    /// Always report the same date.
    Fixed(Date),
}

impl LedgerClock {
    /// Read the current local date.
    ///
    /// # Errors
    /// Returns [Error::InvalidTimezoneError] if the timezone is not a valid,
    /// canonical timezone name.
    pub fn today(&self) -> Result<Date, Error> {
        match self {
            LedgerClock::Fixed(date) => Ok(*date),
            LedgerClock::Local(timezone) => local_date(timezone, OffsetDateTime::now_utc()),
        }
    }
}
