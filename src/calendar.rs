use chrono::{
    DateTime, Datelike, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc, Weekday,
};
use chrono_tz::Tz;
use tracing::warn;

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Wall-clock facts about the business: where it is and which day it rests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusinessCalendar {
    timezone: Tz,
    closed_weekday: Weekday,
}

impl BusinessCalendar {
    pub fn new(timezone: Tz, closed_weekday: Weekday) -> Self {
        Self {
            timezone,
            closed_weekday,
        }
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    pub fn closed_weekday(&self) -> Weekday {
        self.closed_weekday
    }

    pub fn is_closed_day(&self, date: NaiveDate) -> bool {
        date.weekday() == self.closed_weekday
    }

    /// The business-local date that `now` falls on.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.timezone).date_naive()
    }

    /// The instant at which `slot` starts on `date`, read as local wall-clock
    /// time. Ambiguous times take the earlier instant; times skipped by a DST
    /// jump resolve to the first instant after the gap.
    pub fn slot_instant(&self, date: NaiveDate, slot: NaiveTime) -> DateTime<Utc> {
        let local = date.and_time(slot);
        match self.timezone.from_local_datetime(&local) {
            LocalResult::Single(instant) => instant.with_timezone(&Utc),
            LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            LocalResult::None => {
                // Zone transitions fall on whole minutes, so the first valid
                // minute after `local` is where the gap ends.
                let after_gap = (1..=MINUTES_PER_DAY)
                    .map(|minutes| local + Duration::minutes(minutes))
                    .find_map(|candidate| self.timezone.from_local_datetime(&candidate).earliest());
                match after_gap {
                    Some(instant) => instant.with_timezone(&Utc),
                    None => {
                        warn!(%date, %slot, timezone = %self.timezone, "No valid local time after gap, reading slot as UTC");
                        Utc.from_utc_datetime(&local)
                    }
                }
            }
        }
    }

    /// A slot has elapsed once its start instant lies strictly before `now`.
    pub fn has_elapsed(&self, date: NaiveDate, slot: NaiveTime, now: DateTime<Utc>) -> bool {
        self.slot_instant(date, slot) < now
    }
}
