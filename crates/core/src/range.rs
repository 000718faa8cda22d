//! Reporting date ranges.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};

/// A closed interval `[start, end]` of UTC instants.
///
/// Report consumers usually think in local calendar days; `calendar_days`
/// translates those into the UTC instants the ledger stores.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl DateRange {
    /// Build a range from two instants. The end must not precede the start.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> LedgerResult<Self> {
        if end < start {
            return Err(LedgerError::date_range(format!(
                "end {end} precedes start {start}"
            )));
        }
        Ok(Self { start, end })
    }

    /// Whole calendar days in the given timezone: from the first day's local
    /// midnight to the last day's final local microsecond, both as UTC.
    pub fn calendar_days(
        first: NaiveDate,
        last: NaiveDate,
        tz: FixedOffset,
    ) -> LedgerResult<Self> {
        let start_local = first.and_time(NaiveTime::MIN);
        let end_local = last
            .and_hms_micro_opt(23, 59, 59, 999_999)
            .ok_or_else(|| LedgerError::date_range(format!("unrepresentable day: {last}")))?;

        let start = localize(start_local, tz)?;
        let end = localize(end_local, tz)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether an instant falls inside the range (both bounds inclusive).
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

fn localize(local: chrono::NaiveDateTime, tz: FixedOffset) -> LedgerResult<DateTime<Utc>> {
    // Fixed offsets have no DST gaps, so `single` only fails on arithmetic
    // overflow near the representable limits.
    tz.from_local_datetime(&local)
        .single()
        .map(|at| at.with_timezone(&Utc))
        .ok_or_else(|| LedgerError::date_range(format!("unrepresentable instant: {local}")))
}
