use crate::{
    error::StoreError,
    types::{NewReservation, Reservation},
};
use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

#[cfg(test)]
use mockall::automock;

/// Durable home of reservations. Implementations must reject a second insert
/// for an occupied `(date, slot)` atomically, with [`StoreError::UniqueViolation`].
#[cfg_attr(test, automock)]
pub trait ReservationBackend: Send + Sync + 'static {
    fn reserved_slots(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError>;
    /// Reservations of one day, ordered by slot.
    fn reservations(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError>;
    /// Every reservation, ordered by date and slot.
    fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError>;
    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, StoreError>;
    /// Deletes by id and hands back the removed row.
    fn remove_reservation(&self, id: Uuid) -> Result<Reservation, StoreError>;
}
