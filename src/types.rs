use chrono::{DateTime, NaiveDate, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[cfg(feature = "postgres")]
use diesel::{Insertable, Queryable, Selectable};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(Queryable, Selectable))]
#[cfg_attr(feature = "postgres", diesel(table_name = crate::schema::reservations))]
pub struct Reservation {
    pub id: Uuid,
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    #[cfg_attr(feature = "postgres", diesel(column_name = slot_start))]
    pub slot: NaiveTime,
    pub holder_name: String,
    pub holder_contact: String,
    pub service: String,
    pub created_at: DateTime<Utc>,
}

/// A validated reservation on its way into the store. Id and creation time are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "postgres", derive(Insertable))]
#[cfg_attr(feature = "postgres", diesel(table_name = crate::schema::reservations))]
pub struct NewReservation {
    pub date: NaiveDate,
    #[cfg_attr(feature = "postgres", diesel(column_name = slot_start))]
    pub slot: NaiveTime,
    pub holder_name: String,
    pub holder_contact: String,
    pub service: String,
}

/// What a caller asks the engine to book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationRequest {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot: NaiveTime,
    pub holder_name: String,
    pub holder_contact: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotStatus {
    Available,
    Reserved,
    Past,
    DayClosed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotView {
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    pub status: SlotStatus,
    pub bookable: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub weekday: Weekday,
    pub closed: bool,
    pub slots: Vec<SlotView>,
}

impl DayAvailability {
    pub fn status_of(&self, start: NaiveTime) -> Option<SlotStatus> {
        self.slots
            .iter()
            .find(|view| view.start == start)
            .map(|view| view.status)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Reserved,
    Cancelled,
}

/// Refresh hint published after every successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AvailabilityChange {
    pub date: NaiveDate,
    #[serde(with = "hhmm")]
    pub slot: NaiveTime,
    pub kind: ChangeKind,
}

/// Slot times travel as `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format(FORMAT))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&raw, FORMAT).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn slot_times_serialize_as_hours_and_minutes() {
        let change = AvailabilityChange {
            date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
            slot: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            kind: ChangeKind::Reserved,
        };
        let json = serde_json::to_value(change).unwrap();
        assert_eq!(json["slot"], "09:30");
        assert_eq!(json["date"], "2026-10-20");
        assert_eq!(json["kind"], "reserved");
    }

    #[test]
    fn request_rejects_malformed_slot() {
        let body = r#"{"date":"2026-10-20","slot":"9.30","holder_name":"A","holder_contact":"1"}"#;
        assert!(serde_json::from_str::<ReservationRequest>(body).is_err());

        let body = r#"{"date":"2026-10-20","slot":"09:30","holder_name":"A","holder_contact":"1"}"#;
        let request: ReservationRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.slot, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
        assert_eq!(request.service, None);
    }
}
