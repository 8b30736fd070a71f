use crate::{
    backend::ReservationBackend,
    error::StoreError,
    types::{NewReservation, Reservation},
};
use chrono::{NaiveDate, NaiveTime, Utc};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, Mutex, MutexGuard},
};
use tracing::error;
use uuid::Uuid;

#[derive(Debug, Default)]
struct Table {
    rows: HashMap<Uuid, Reservation>,
    occupied: HashSet<(NaiveDate, NaiveTime)>,
}

/// In-memory store. Rows and the `(date, slot)` index share one lock, so the
/// occupancy check and the insert are a single step.
#[derive(Debug, Clone, Default)]
pub struct LocalReservations {
    table: Arc<Mutex<Table>>,
}

impl LocalReservations {
    fn lock(&self) -> Result<MutexGuard<'_, Table>, StoreError> {
        self.table.lock().map_err(|err| {
            error!(%err, "Reservation table lock poisoned");
            StoreError::Unavailable("reservation table lock poisoned".into())
        })
    }
}

impl ReservationBackend for LocalReservations {
    fn reserved_slots(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError> {
        let table = self.lock()?;
        let mut slots: Vec<NaiveTime> = table
            .occupied
            .iter()
            .filter(|(day, _)| *day == date)
            .map(|(_, slot)| *slot)
            .collect();
        slots.sort_unstable();
        Ok(slots)
    }

    fn reservations(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError> {
        let table = self.lock()?;
        let mut reservations: Vec<Reservation> = table
            .rows
            .values()
            .filter(|reservation| reservation.date == date)
            .cloned()
            .collect();
        reservations.sort_unstable_by_key(|reservation| reservation.slot);
        Ok(reservations)
    }

    fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        let table = self.lock()?;
        let mut reservations: Vec<Reservation> = table.rows.values().cloned().collect();
        reservations.sort_unstable_by_key(|reservation| (reservation.date, reservation.slot));
        Ok(reservations)
    }

    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, StoreError> {
        let mut table = self.lock()?;
        if !table.occupied.insert((reservation.date, reservation.slot)) {
            return Err(StoreError::UniqueViolation);
        }

        let id = Uuid::new_v4();
        let row = Reservation {
            id,
            date: reservation.date,
            slot: reservation.slot,
            holder_name: reservation.holder_name,
            holder_contact: reservation.holder_contact,
            service: reservation.service,
            created_at: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    fn remove_reservation(&self, id: Uuid) -> Result<Reservation, StoreError> {
        let mut table = self.lock()?;
        let row = table.rows.remove(&id).ok_or(StoreError::NotFound)?;
        table.occupied.remove(&(row.date, row.slot));
        Ok(row)
    }
}
