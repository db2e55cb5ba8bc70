pub mod memory;
pub mod offline;
pub mod sqlite;

use async_trait::async_trait;

use crate::models::{BookedSlot, Booking, BookingStatus, NewBooking, WildcardPolicy};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("slot already booked")]
    SlotTaken,

    #[error("booking id already exists: {0}")]
    DuplicateBookingId(String),

    #[error("record store unavailable")]
    Unavailable,

    #[error("record store lock poisoned")]
    Poisoned,

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
}

/// Persistence for bookings.
///
/// `insert` performs the slot check and the write as one operation, so two
/// concurrent inserts for the same live slot can never both succeed.
/// Every lookup by id accepts either the record id or the `bookingId` and
/// resolves to at most one record, preferring a record id match.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn is_ready(&self) -> bool;

    async fn insert(
        &self,
        booking: &NewBooking,
        policy: WildcardPolicy,
    ) -> Result<Booking, StoreError>;

    async fn list(&self) -> Result<Vec<Booking>, StoreError>;

    async fn booked_slots(&self, date: &str) -> Result<Vec<BookedSlot>, StoreError>;

    async fn find(&self, id: &str) -> Result<Option<Booking>, StoreError>;

    /// Writes back every mutable field of `booking`; `None` if the record is gone.
    /// A live booking moved onto a slot held under `policy` is `SlotTaken`.
    async fn replace(
        &self,
        booking: &Booking,
        policy: WildcardPolicy,
    ) -> Result<Option<Booking>, StoreError>;

    async fn set_status(
        &self,
        id: &str,
        status: BookingStatus,
    ) -> Result<Option<Booking>, StoreError>;

    async fn delete(&self, id: &str) -> Result<bool, StoreError>;
}

/// Current time truncated to milliseconds, the precision the stores keep.
pub(crate) fn now_millis() -> chrono::DateTime<chrono::Utc> {
    let now = chrono::Utc::now();
    chrono::DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
