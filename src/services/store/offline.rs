use async_trait::async_trait;

use super::{BookingStore, StoreError};
use crate::models::{BookedSlot, Booking, BookingStatus, NewBooking, WildcardPolicy};

/// Stand-in used when the database could not be opened at startup.
/// Never ready; every operation fails with [`StoreError::Unavailable`].
pub struct OfflineStore;

#[async_trait]
impl BookingStore for OfflineStore {
    async fn is_ready(&self) -> bool {
        false
    }

    async fn insert(&self, _: &NewBooking, _: WildcardPolicy) -> Result<Booking, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn list(&self) -> Result<Vec<Booking>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn booked_slots(&self, _: &str) -> Result<Vec<BookedSlot>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn find(&self, _: &str) -> Result<Option<Booking>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn replace(&self, _: &Booking, _: WildcardPolicy) -> Result<Option<Booking>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn set_status(&self, _: &str, _: BookingStatus) -> Result<Option<Booking>, StoreError> {
        Err(StoreError::Unavailable)
    }

    async fn delete(&self, _: &str) -> Result<bool, StoreError> {
        Err(StoreError::Unavailable)
    }
}
