use crate::config::DayBoundary;
use chrono::{DateTime, Duration, Local, NaiveTime, Offset, TimeZone, Utc};

/// Half-open `[start, end)` interval covering one calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// The day containing `now`, measured from midnight at `boundary`.
pub fn day_window(now: DateTime<Utc>, boundary: DayBoundary) -> DayWindow {
    match boundary {
        DayBoundary::Local => window_in(now, &Local),
        DayBoundary::Utc => window_in(now, &Utc),
    }
}

pub(crate) fn window_in<Tz: TimeZone>(now: DateTime<Utc>, tz: &Tz) -> DayWindow {
    let local = now.with_timezone(tz);
    let midnight = local.date_naive().and_time(NaiveTime::MIN);

    let start = match tz.from_local_datetime(&midnight).earliest() {
        Some(start) => start.with_timezone(&Utc),
        // Midnight skipped by a DST change; use the current offset instead.
        None => {
            let offset = i64::from(local.offset().fix().local_minus_utc());
            (midnight - Duration::seconds(offset)).and_utc()
        }
    };

    DayWindow {
        start,
        end: start + Duration::hours(24),
    }
}
