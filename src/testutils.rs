use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc,
};

use chrono::{NaiveDate, NaiveTime};
use uuid::Uuid;

use crate::{
    backend::ReservationBackend,
    error::StoreError,
    local_reservations::LocalReservations,
    types::{NewReservation, Reservation},
};

pub struct CountingBackendInner {
    pub available: AtomicBool,
    pub calls_to_reserved_slots: AtomicU64,
    pub calls_to_reservations: AtomicU64,
    pub calls_to_all_reservations: AtomicU64,
    pub calls_to_insert_reservation: AtomicU64,
    pub calls_to_remove_reservation: AtomicU64,
    pub store: LocalReservations,
}

/// In-memory store that counts every call and can be switched offline.
#[derive(Clone)]
pub struct CountingBackend(pub Arc<CountingBackendInner>);

impl CountingBackend {
    pub fn new() -> Self {
        Self(Arc::new(CountingBackendInner {
            available: AtomicBool::new(true),
            calls_to_reserved_slots: AtomicU64::default(),
            calls_to_reservations: AtomicU64::default(),
            calls_to_all_reservations: AtomicU64::default(),
            calls_to_insert_reservation: AtomicU64::default(),
            calls_to_remove_reservation: AtomicU64::default(),
            store: LocalReservations::default(),
        }))
    }

    pub fn go_offline(&self) {
        self.0.available.store(false, Ordering::SeqCst);
    }

    pub fn reads(&self) -> u64 {
        self.0.calls_to_reserved_slots.load(Ordering::SeqCst)
            + self.0.calls_to_reservations.load(Ordering::SeqCst)
            + self.0.calls_to_all_reservations.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> u64 {
        self.0.calls_to_insert_reservation.load(Ordering::SeqCst)
            + self.0.calls_to_remove_reservation.load(Ordering::SeqCst)
    }

    fn check(&self, counter: &AtomicU64) -> Result<(), StoreError> {
        counter.fetch_add(1, Ordering::SeqCst);
        match self.0.available.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(StoreError::Unavailable("supposed to fail".into())),
        }
    }
}

impl ReservationBackend for CountingBackend {
    fn reserved_slots(&self, date: NaiveDate) -> Result<Vec<NaiveTime>, StoreError> {
        self.check(&self.0.calls_to_reserved_slots)?;
        self.0.store.reserved_slots(date)
    }

    fn reservations(&self, date: NaiveDate) -> Result<Vec<Reservation>, StoreError> {
        self.check(&self.0.calls_to_reservations)?;
        self.0.store.reservations(date)
    }

    fn all_reservations(&self) -> Result<Vec<Reservation>, StoreError> {
        self.check(&self.0.calls_to_all_reservations)?;
        self.0.store.all_reservations()
    }

    fn insert_reservation(&self, reservation: NewReservation) -> Result<Reservation, StoreError> {
        self.check(&self.0.calls_to_insert_reservation)?;
        self.0.store.insert_reservation(reservation)
    }

    fn remove_reservation(&self, id: Uuid) -> Result<Reservation, StoreError> {
        self.check(&self.0.calls_to_remove_reservation)?;
        self.0.store.remove_reservation(id)
    }
}
