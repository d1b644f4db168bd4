//! Analytics time ranges

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use std::fmt;
use std::str::FromStr;

/// Selectable reporting window for the analytics dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnalyticsRange {
    /// Trailing 7 days
    Week,
    /// Trailing 30 days
    #[default]
    Month,
    /// Everything on record
    All,
}

impl AnalyticsRange {
    /// Inclusive start of the window, anchored at `now`.
    ///
    /// `All` uses the minimum representable instant so the same `>=`
    /// comparison covers every stored row.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            AnalyticsRange::Week => now - Duration::days(7),
            AnalyticsRange::Month => now - Duration::days(30),
            AnalyticsRange::All => DateTime::<Utc>::MIN_UTC,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AnalyticsRange::Week => "week",
            AnalyticsRange::Month => "month",
            AnalyticsRange::All => "all",
        }
    }
}

impl FromStr for AnalyticsRange {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" => Ok(AnalyticsRange::Week),
            "month" => Ok(AnalyticsRange::Month),
            "all" => Ok(AnalyticsRange::All),
            other => Err(crate::Error::InvalidParameter(format!(
                "unknown range '{}', expected week, month, or all",
                other
            ))),
        }
    }
}

impl fmt::Display for AnalyticsRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// First instant of the calendar month containing `now`, in UTC.
///
/// Month-to-date figures are anchored here regardless of the selected
/// range.
pub fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    // The first of the month always exists
    Utc.with_ymd_and_hms(now.year(), now.month(), 1, 0, 0, 0)
        .single()
        .unwrap_or(now)
}
