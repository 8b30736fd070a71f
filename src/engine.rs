use std::{collections::HashSet, sync::Arc};

use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::broadcast;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::{
    availability,
    backend::ReservationBackend,
    calendar::BusinessCalendar,
    error::{EngineError, StoreError, ValidationError},
    policy::Actor,
    slots::BusinessHours,
    types::{
        AvailabilityChange, ChangeKind, DayAvailability, NewReservation, Reservation,
        ReservationRequest,
    },
};

/// Changes a slow subscriber may fall behind by before it starts missing hints.
const CHANGE_FEED_CAPACITY: usize = 256;

/// Entry point for availability queries and reservation writes.
///
/// The engine never decides uniqueness itself. Every write is one conditional
/// insert, and the backend's answer is final: a uniqueness violation becomes
/// [`EngineError::Conflict`], anything else a transient [`EngineError::Store`].
pub struct ReservationEngine<B: ReservationBackend> {
    backend: Arc<B>,
    calendar: BusinessCalendar,
    hours: BusinessHours,
    service_label: String,
    changes: broadcast::Sender<AvailabilityChange>,
}

impl<B: ReservationBackend> Clone for ReservationEngine<B> {
    fn clone(&self) -> Self {
        Self {
            backend: self.backend.clone(),
            calendar: self.calendar,
            hours: self.hours,
            service_label: self.service_label.clone(),
            changes: self.changes.clone(),
        }
    }
}

impl<B: ReservationBackend> ReservationEngine<B> {
    pub fn new(
        backend: Arc<B>,
        calendar: BusinessCalendar,
        hours: BusinessHours,
        service_label: impl Into<String>,
    ) -> Self {
        let (changes, _) = broadcast::channel(CHANGE_FEED_CAPACITY);
        Self {
            backend,
            calendar,
            hours,
            service_label: service_label.into(),
            changes,
        }
    }

    pub fn calendar(&self) -> &BusinessCalendar {
        &self.calendar
    }

    pub fn hours(&self) -> &BusinessHours {
        &self.hours
    }

    /// Fresh status of every slot on `date`. Closed days are answered without
    /// reading the store. A failed read is an error, never an empty day.
    pub fn enumerate_day(
        &self,
        date: NaiveDate,
        now: DateTime<Utc>,
        actor: &Actor,
    ) -> Result<DayAvailability, EngineError> {
        let reserved: HashSet<_> = if self.calendar.is_closed_day(date) {
            HashSet::new()
        } else {
            self.backend
                .reserved_slots(date)
                .map_err(|err| unavailable(err, "Availability unknown"))?
                .into_iter()
                .collect()
        };
        Ok(availability::resolve(
            &self.calendar,
            &self.hours,
            date,
            now,
            &reserved,
            actor,
        ))
    }

    /// Validates and writes one reservation. `now` is the instant the write is
    /// handled; client time checks are evaluated against it.
    pub fn reserve(
        &self,
        request: ReservationRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Reservation, EngineError> {
        let reservation = self.validate(request, actor, now)?;
        let (date, slot) = (reservation.date, reservation.slot);

        match self.backend.insert_reservation(reservation) {
            Ok(created) => {
                info!(id = %created.id, %date, %slot, ?actor, "Reservation created");
                self.publish(AvailabilityChange {
                    date,
                    slot,
                    kind: ChangeKind::Reserved,
                });
                Ok(created)
            }
            Err(StoreError::UniqueViolation) => {
                warn!(%date, %slot, ?actor, "Slot already taken");
                Err(EngineError::Conflict { date, slot })
            }
            Err(err) => Err(unavailable(err, "Reservation write failed")),
        }
    }

    /// An operator books on behalf of a third party through the same write path.
    pub fn reserve_on_behalf(
        &self,
        request: ReservationRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<Reservation, EngineError> {
        if !actor.is_operator() {
            warn!(?actor, "Manual reservation refused");
            return Err(EngineError::Forbidden("only operators may reserve on behalf of others"));
        }
        self.reserve(request, actor, now)
    }

    pub fn cancel(&self, id: Uuid, actor: &Actor) -> Result<Reservation, EngineError> {
        if !actor.is_operator() {
            warn!(%id, ?actor, "Cancellation refused");
            return Err(EngineError::Forbidden("only operators may cancel reservations"));
        }
        match self.backend.remove_reservation(id) {
            Ok(removed) => {
                info!(%id, date = %removed.date, slot = %removed.slot, ?actor, "Reservation cancelled");
                self.publish(AvailabilityChange {
                    date: removed.date,
                    slot: removed.slot,
                    kind: ChangeKind::Cancelled,
                });
                Ok(removed)
            }
            Err(StoreError::NotFound) => Err(EngineError::NotFound(id)),
            Err(err) => Err(unavailable(err, "Cancellation failed")),
        }
    }

    /// Every reservation on record, ordered by date and slot. Operator-only.
    pub fn all_reservations(&self, actor: &Actor) -> Result<Vec<Reservation>, EngineError> {
        if !actor.is_operator() {
            return Err(EngineError::Forbidden("only operators may list reservations"));
        }
        self.backend
            .all_reservations()
            .map_err(|err| unavailable(err, "Listing reservations failed"))
    }

    /// Full reservation rows of one day. Holder details are operator-only.
    pub fn reservations_for_day(
        &self,
        date: NaiveDate,
        actor: &Actor,
    ) -> Result<Vec<Reservation>, EngineError> {
        if !actor.is_operator() {
            return Err(EngineError::Forbidden("only operators may list reservations"));
        }
        self.backend
            .reservations(date)
            .map_err(|err| unavailable(err, "Listing reservations failed"))
    }

    /// Every change published after this call, in order.
    pub fn subscribe(&self) -> broadcast::Receiver<AvailabilityChange> {
        self.changes.subscribe()
    }

    fn validate(
        &self,
        request: ReservationRequest,
        actor: &Actor,
        now: DateTime<Utc>,
    ) -> Result<NewReservation, ValidationError> {
        let holder_name = request.holder_name.trim();
        if holder_name.is_empty() {
            return Err(ValidationError::EmptyHolderName);
        }
        let holder_contact = request.holder_contact.trim();
        if holder_contact.is_empty() {
            return Err(ValidationError::EmptyHolderContact);
        }
        if !self.hours.contains(request.slot) {
            return Err(ValidationError::UnknownSlot(request.slot));
        }
        if let Actor::Client = actor {
            if self.calendar.is_closed_day(request.date) {
                return Err(ValidationError::ClosedDay(request.date));
            }
            if self.calendar.has_elapsed(request.date, request.slot, now) {
                return Err(ValidationError::SlotElapsed(request.date, request.slot));
            }
        }

        let service = request
            .service
            .as_deref()
            .map(str::trim)
            .filter(|service| !service.is_empty())
            .unwrap_or(self.service_label.as_str())
            .to_string();

        Ok(NewReservation {
            date: request.date,
            slot: request.slot,
            holder_name: holder_name.to_string(),
            holder_contact: holder_contact.to_string(),
            service,
        })
    }

    fn publish(&self, change: AvailabilityChange) {
        // No subscribers is fine; the change is only a refresh hint.
        let _ = self.changes.send(change);
    }
}

fn unavailable(err: StoreError, context: &'static str) -> EngineError {
    error!(%err, "{context}");
    EngineError::Store(err.to_string())
}
