use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rusqlite::{Connection, ErrorCode};
use uuid::Uuid;

use super::{now_millis, BookingStore, StoreError};
use crate::db::queries;
use crate::models::{BookedSlot, Booking, BookingStatus, NewBooking, WildcardPolicy};

/// SQLite-backed store. Slot uniqueness for live bookings is also enforced by
/// the partial unique index `idx_bookings_active_slot`.
#[derive(Clone)]
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

/// Maps unique-constraint failures onto the store's domain errors.
fn classify(err: rusqlite::Error, booking_id: &str) -> StoreError {
    if err.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
        let detail = err.to_string();
        if detail.contains("bookings.booking_id") {
            return StoreError::DuplicateBookingId(booking_id.to_string());
        }
        if detail.contains("bookings.date") {
            return StoreError::SlotTaken;
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl BookingStore for SqliteStore {
    async fn is_ready(&self) -> bool {
        match self.lock() {
            Ok(conn) => conn
                .query_row("SELECT 1", [], |row| row.get::<_, i64>(0))
                .is_ok(),
            Err(_) => false,
        }
    }

    async fn insert(
        &self,
        booking: &NewBooking,
        policy: WildcardPolicy,
    ) -> Result<Booking, StoreError> {
        let id = Uuid::new_v4().to_string();
        let now = now_millis();

        let inserted = {
            let conn = self.lock()?;
            if queries::record_id_exists(&conn, &booking.booking_id)? {
                return Err(StoreError::DuplicateBookingId(booking.booking_id.clone()));
            }
            queries::insert_booking_if_slot_free(&conn, &id, booking, policy, &now)
                .map_err(|e| classify(e, &booking.booking_id))?
        };

        if !inserted {
            return Err(StoreError::SlotTaken);
        }

        Ok(Booking {
            id,
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
        })
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        let conn = self.lock()?;
        Ok(queries::get_all_bookings(&conn)?)
    }

    async fn booked_slots(&self, date: &str) -> Result<Vec<BookedSlot>, StoreError> {
        let conn = self.lock()?;
        Ok(queries::get_booked_slots(&conn, date)?)
    }

    async fn find(&self, id: &str) -> Result<Option<Booking>, StoreError> {
        let conn = self.lock()?;
        Ok(queries::find_booking(&conn, id)?)
    }

    async fn replace(
        &self,
        booking: &Booking,
        policy: WildcardPolicy,
    ) -> Result<Option<Booking>, StoreError> {
        let conn = self.lock()?;
        if !queries::record_id_exists(&conn, &booking.id)? {
            return Ok(None);
        }
        let updated = queries::update_booking(&conn, booking, policy, &now_millis())
            .map_err(|e| classify(e, &booking.booking_id))?;
        if !updated {
            return Err(StoreError::SlotTaken);
        }
        Ok(queries::get_booking_by_id(&conn, &booking.id)?)
    }

    async fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError> {
        let conn = self.lock()?;
        let Some(record_id) = queries::resolve_booking_id(&conn, id)? else {
            return Ok(None);
        };
        queries::update_booking_status(&conn, &record_id, status, &now_millis())
            .map_err(|e| classify(e, id))?;
        Ok(queries::get_booking_by_id(&conn, &record_id)?)
    }

    async fn delete(&self, id: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        match queries::resolve_booking_id(&conn, id)? {
            Some(record_id) => Ok(queries::delete_booking(&conn, &record_id)?),
            None => Ok(false),
        }
    }
}
