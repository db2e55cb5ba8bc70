use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{now_millis, BookingStore, StoreError};
use crate::models::{BookedSlot, Booking, BookingStatus, NewBooking, WildcardPolicy};

/// Non-durable store holding bookings in insertion order. Applies the same
/// slot and `bookingId` uniqueness rules as [`super::sqlite::SqliteStore`].
#[derive(Default)]
pub struct MemoryStore {
    bookings: Mutex<Vec<Booking>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<Booking>>, StoreError> {
        self.bookings.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Position of the one record `key` names: a record id match first, then a
/// `bookingId` match.
fn resolve(bookings: &[Booking], key: &str) -> Option<usize> {
    bookings
        .iter()
        .position(|b| b.id == key)
        .or_else(|| bookings.iter().position(|b| b.booking_id == key))
}

#[async_trait]
impl BookingStore for MemoryStore {
    async fn is_ready(&self) -> bool {
        self.bookings.lock().is_ok()
    }

    async fn insert(
        &self,
        booking: &NewBooking,
        policy: WildcardPolicy,
    ) -> Result<Booking, StoreError> {
        let mut bookings = self.lock()?;

        if bookings
            .iter()
            .any(|b| b.booking_id == booking.booking_id || b.id == booking.booking_id)
        {
            return Err(StoreError::DuplicateBookingId(booking.booking_id.clone()));
        }

        let blocked = bookings.iter().any(|b| {
            b.status.is_active()
                && b.date == booking.date
                && b.time == booking.time
                && policy.blocks(&booking.stylist, &b.stylist)
        });
        if blocked {
            return Err(StoreError::SlotTaken);
        }

        let now = now_millis();
        let stored = Booking {
            id: Uuid::new_v4().to_string(),
            booking_id: booking.booking_id.clone(),
            date: booking.date.clone(),
            time: booking.time.clone(),
            service: booking.service.clone(),
            stylist: booking.stylist.clone(),
            customer: booking.customer.clone(),
            status: booking.status,
            notes: booking.notes.clone(),
            price: booking.price,
            created_at: now,
            updated_at: now,
        };
        bookings.push(stored.clone());
        Ok(stored)
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = self.lock()?;
        let mut all = bookings.clone();
        all.reverse();
        // stable sort keeps later inserts first among equal timestamps
        all.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(all)
    }

    async fn booked_slots(&self, date: &str) -> Result<Vec<BookedSlot>, StoreError> {
        let bookings = self.lock()?;
        let mut slots: Vec<BookedSlot> = bookings
            .iter()
            .filter(|b| b.date == date && b.status.is_active())
            .map(|b| BookedSlot {
                time: b.time.clone(),
                stylist: b.stylist.clone(),
            })
            .collect();
        slots.sort_by(|a, b| a.time.cmp(&b.time).then_with(|| a.stylist.cmp(&b.stylist)));
        Ok(slots)
    }

    async fn find(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let bookings = self.lock()?;
        Ok(resolve(&bookings, id).map(|i| bookings[i].clone()))
    }

    async fn replace(
        &self,
        booking: &Booking,
        policy: WildcardPolicy,
    ) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.lock()?;

        if !bookings.iter().any(|b| b.id == booking.id) {
            return Ok(None);
        }

        let blocked = booking.status.is_active()
            && bookings.iter().any(|b| {
                b.id != booking.id
                    && b.status.is_active()
                    && b.date == booking.date
                    && b.time == booking.time
                    && policy.blocks(&booking.stylist, &b.stylist)
            });
        if blocked {
            return Err(StoreError::SlotTaken);
        }

        let Some(existing) = bookings.iter_mut().find(|b| b.id == booking.id) else {
            return Ok(None);
        };
        existing.date = booking.date.clone();
        existing.time = booking.time.clone();
        existing.service = booking.service.clone();
        existing.stylist = booking.stylist.clone();
        existing.customer = booking.customer.clone();
        existing.status = booking.status;
        existing.notes = booking.notes.clone();
        existing.price = booking.price;
        existing.updated_at = now_millis();
        Ok(Some(existing.clone()))
    }

    async fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let mut bookings = self.lock()?;
        let Some(i) = resolve(&bookings, id) else {
            return Ok(None);
        };
        let existing = &mut bookings[i];
        existing.status = status;
        existing.updated_at = now_millis();
        Ok(Some(existing.clone()))
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let mut bookings = self.lock()?;
        match resolve(&bookings, id) {
            Some(i) => {
                bookings.remove(i);
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
