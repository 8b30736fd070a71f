use std::collections::HashSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

use crate::{
    calendar::BusinessCalendar,
    policy::Actor,
    slots::BusinessHours,
    types::{DayAvailability, SlotStatus, SlotView},
};

/// Per-slot status of one day. Closed days short-circuit: every slot is
/// `DayClosed` and `reserved` is not consulted. Otherwise a reserved slot stays
/// `Reserved` even after it has elapsed.
pub fn resolve(
    calendar: &BusinessCalendar,
    hours: &BusinessHours,
    date: NaiveDate,
    now: DateTime<Utc>,
    reserved: &HashSet<NaiveTime>,
    actor: &Actor,
) -> DayAvailability {
    let closed = calendar.is_closed_day(date);
    let slots = hours
        .slots()
        .map(|start| {
            let status = if closed {
                SlotStatus::DayClosed
            } else if reserved.contains(&start) {
                SlotStatus::Reserved
            } else if calendar.has_elapsed(date, start, now) {
                SlotStatus::Past
            } else {
                SlotStatus::Available
            };
            SlotView {
                start,
                end: hours.slot_end(start),
                status,
                bookable: is_bookable(status, actor),
            }
        })
        .collect();

    DayAvailability {
        date,
        weekday: date.weekday(),
        closed,
        slots,
    }
}

/// Operators may book past slots and closed days; nobody may book a reserved slot.
fn is_bookable(status: SlotStatus, actor: &Actor) -> bool {
    match actor {
        Actor::Client => status == SlotStatus::Available,
        Actor::Operator { .. } => status != SlotStatus::Reserved,
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chrono::{TimeZone, Weekday};
    use chrono_tz::Europe::Belgrade;

    fn calendar() -> BusinessCalendar {
        BusinessCalendar::new(Belgrade, Weekday::Sun)
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn operator() -> Actor {
        Actor::Operator {
            name: "front-desk".into(),
        }
    }

    // Tuesday 2026-10-20, 12:10 in Belgrade.
    fn tuesday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 20).unwrap()
    }

    fn tuesday_noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 20, 10, 10, 0).unwrap()
    }

    #[test]
    fn closure_day_marks_every_slot_closed_even_with_stray_reservation() {
        let sunday = NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let reserved = HashSet::from([time(10, 0)]);

        let view = resolve(
            &calendar(),
            &BusinessHours::default(),
            sunday,
            tuesday_noon(),
            &reserved,
            &Actor::Client,
        );

        assert!(view.closed);
        assert_eq!(view.weekday, Weekday::Sun);
        assert_eq!(view.slots.len(), 22);
        assert!(view.slots.iter().all(|s| s.status == SlotStatus::DayClosed));
        assert!(view.slots.iter().all(|s| !s.bookable));
    }

    #[test]
    fn today_splits_into_past_reserved_and_available() {
        let reserved = HashSet::from([time(9, 0), time(15, 0)]);

        let view = resolve(
            &calendar(),
            &BusinessHours::default(),
            tuesday(),
            tuesday_noon(),
            &reserved,
            &Actor::Client,
        );

        assert_eq!(view.status_of(time(9, 0)), Some(SlotStatus::Reserved));
        assert_eq!(view.status_of(time(9, 30)), Some(SlotStatus::Past));
        assert_eq!(view.status_of(time(12, 0)), Some(SlotStatus::Past));
        assert_eq!(view.status_of(time(12, 30)), Some(SlotStatus::Available));
        assert_eq!(view.status_of(time(15, 0)), Some(SlotStatus::Reserved));
        assert_eq!(view.status_of(time(19, 30)), Some(SlotStatus::Available));
        assert!(view
            .slots
            .windows(2)
            .all(|pair| pair[0].start < pair[1].start));
    }

    #[test]
    fn future_day_is_fully_available() {
        let thursday = NaiveDate::from_ymd_opt(2026, 10, 22).unwrap();
        let view = resolve(
            &calendar(),
            &BusinessHours::default(),
            thursday,
            tuesday_noon(),
            &HashSet::new(),
            &Actor::Client,
        );
        assert!(view.slots.iter().all(|s| s.status == SlotStatus::Available && s.bookable));
    }

    #[test]
    fn past_day_is_fully_past() {
        let monday = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();
        let view = resolve(
            &calendar(),
            &BusinessHours::default(),
            monday,
            tuesday_noon(),
            &HashSet::new(),
            &Actor::Client,
        );
        assert!(view.slots.iter().all(|s| s.status == SlotStatus::Past));
    }

    #[test]
    fn operator_may_book_everything_but_reserved_slots() {
        let reserved = HashSet::from([time(13, 0)]);
        let view = resolve(
            &calendar(),
            &BusinessHours::default(),
            tuesday(),
            tuesday_noon(),
            &reserved,
            &operator(),
        );

        for slot in &view.slots {
            assert_eq!(slot.bookable, slot.status != SlotStatus::Reserved);
        }
        let past = view.slots.iter().find(|s| s.start == time(9, 30)).unwrap();
        assert_eq!(past.status, SlotStatus::Past);
        assert!(past.bookable);
    }

    #[test]
    fn resolving_twice_gives_identical_views() {
        let reserved = HashSet::from([time(17, 30)]);
        let first = resolve(
            &calendar(),
            &BusinessHours::default(),
            tuesday(),
            tuesday_noon(),
            &reserved,
            &Actor::Client,
        );
        let second = resolve(
            &calendar(),
            &BusinessHours::default(),
            tuesday(),
            tuesday_noon(),
            &reserved,
            &Actor::Client,
        );
        assert_eq!(first, second);
    }
}
