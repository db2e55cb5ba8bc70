use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{
    is_valid_date, BookedSlot, Booking, BookingPatch, BookingStatus, CreateBookingRequest,
    Customer, NewBooking, WildcardPolicy,
};
use crate::services::store::{BookingStore, StoreError};

const MAX_ID_ATTEMPTS: usize = 3;

/// Result of an operation that may have been served without the store.
#[derive(Debug, Clone)]
pub struct Accepted<T> {
    pub data: T,
    /// `false` when the store was unreachable and degraded mode answered instead.
    pub durable: bool,
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    policy: WildcardPolicy,
    degraded_mode: bool,
}

impl BookingService {
    pub fn new(store: Arc<dyn BookingStore>, policy: WildcardPolicy, degraded_mode: bool) -> Self {
        Self {
            store,
            policy,
            degraded_mode,
        }
    }

    pub async fn store_ready(&self) -> bool {
        self.store.is_ready().await
    }

    pub async fn create(&self, request: CreateBookingRequest) -> Result<Accepted<Booking>, AppError> {
        let (mut booking, id_generated) = validate_new_booking(request)?;

        if !self.store.is_ready().await {
            if self.degraded_mode {
                tracing::warn!(
                    date = %booking.date,
                    time = %booking.time,
                    "store not ready, answering with non-durable booking"
                );
                return Ok(Accepted {
                    data: unsaved_booking(booking),
                    durable: false,
                });
            }
            return Err(StoreError::Unavailable.into());
        }

        let mut attempts = 1;
        loop {
            match self.store.insert(&booking, self.policy).await {
                Ok(stored) => {
                    tracing::info!(
                        booking_id = %stored.booking_id,
                        date = %stored.date,
                        time = %stored.time,
                        stylist = %stored.stylist,
                        "booking created"
                    );
                    return Ok(Accepted {
                        data: stored,
                        durable: true,
                    });
                }
                Err(StoreError::DuplicateBookingId(_))
                    if id_generated && attempts < MAX_ID_ATTEMPTS =>
                {
                    attempts += 1;
                    booking.booking_id = generate_booking_id();
                }
                Err(StoreError::SlotTaken) => {
                    tracing::info!(
                        date = %booking.date,
                        time = %booking.time,
                        stylist = %booking.stylist,
                        "slot already booked"
                    );
                    return Err(StoreError::SlotTaken.into());
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    pub async fn availability(&self, date: &str) -> Result<Accepted<Vec<BookedSlot>>, AppError> {
        if !is_valid_date(date) {
            return Err(AppError::Validation(format!(
                "Invalid date format. Expected YYYY-MM-DD, got {date:?}"
            )));
        }

        if self.degraded_mode && !self.store.is_ready().await {
            tracing::warn!(%date, "store not ready, reporting an open day");
            return Ok(Accepted {
                data: vec![],
                durable: false,
            });
        }

        let slots = self.store.booked_slots(date).await?;
        tracing::debug!(%date, count = slots.len(), "availability checked");
        Ok(Accepted {
            data: slots,
            durable: true,
        })
    }

    pub async fn list(&self) -> Result<Vec<Booking>, AppError> {
        Ok(self.store.list().await?)
    }

    pub async fn get(&self, id: &str) -> Result<Booking, AppError> {
        self.store
            .find(id)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))
    }

    pub async fn update(&self, id: &str, patch: BookingPatch) -> Result<Booking, AppError> {
        let existing = self.get(id).await?;
        let changed = apply_patch(existing, patch)?;

        let updated = self
            .store
            .replace(&changed, self.policy)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        tracing::info!(booking_id = %updated.booking_id, "booking updated");
        Ok(updated)
    }

    /// Marks the booking cancelled. Cancelling twice is not an error.
    pub async fn cancel(&self, id: &str) -> Result<Booking, AppError> {
        let cancelled = self
            .store
            .set_status(id, BookingStatus::Cancelled)
            .await?
            .ok_or_else(|| AppError::NotFound(id.to_string()))?;
        tracing::info!(booking_id = %cancelled.booking_id, "booking cancelled");
        Ok(cancelled)
    }

    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store.delete(id).await? {
            return Err(AppError::NotFound(id.to_string()));
        }
        tracing::info!(%id, "booking deleted");
        Ok(())
    }
}

/// `BK<unix millis><0-999>`.
pub fn generate_booking_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1000);
    format!("BK{}{}", Utc::now().timestamp_millis(), suffix)
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(AppError::Validation(format!("{field} is required"))),
    }
}

fn required_date(value: Option<String>) -> Result<String, AppError> {
    let date = required(value, "date")?;
    if !is_valid_date(&date) {
        return Err(AppError::Validation(format!(
            "date must be a calendar date in YYYY-MM-DD form, got {date:?}"
        )));
    }
    Ok(date)
}

fn valid_price(price: f64) -> Result<f64, AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(
            "price must be a non-negative number".to_string(),
        ));
    }
    Ok(price)
}

/// Returns the validated booking and whether its `bookingId` was generated here.
fn validate_new_booking(request: CreateBookingRequest) -> Result<(NewBooking, bool), AppError> {
    let date = required_date(request.date)?;
    let time = required(request.time, "time")?;
    let service = required(request.service, "service")?;
    let stylist = required(request.stylist, "stylist")?;

    let customer = request
        .customer
        .ok_or_else(|| AppError::Validation("customer is required".to_string()))?;
    let customer = Customer {
        name: required(customer.name, "customer.name")?,
        phone: required(customer.phone, "customer.phone")?,
        email: customer.email.unwrap_or_default(),
        whatsapp: customer.whatsapp.unwrap_or_default(),
    };

    let (booking_id, id_generated) = match request.booking_id.map(|id| id.trim().to_string()) {
        Some(id) if Uuid::parse_str(&id).is_ok() => {
            return Err(AppError::Validation(
                "bookingId must not have the shape of a record id".to_string(),
            ));
        }
        Some(id) if !id.is_empty() => (id, false),
        _ => (generate_booking_id(), true),
    };

    let booking = NewBooking {
        booking_id,
        date,
        time,
        service,
        stylist,
        customer,
        status: BookingStatus::Confirmed,
        notes: request.notes.unwrap_or_default(),
        price: valid_price(request.price.unwrap_or(0.0))?,
    };
    Ok((booking, id_generated))
}

fn apply_patch(mut booking: Booking, patch: BookingPatch) -> Result<Booking, AppError> {
    if patch.date.is_some() {
        booking.date = required_date(patch.date)?;
    }
    if patch.time.is_some() {
        booking.time = required(patch.time, "time")?;
    }
    if patch.service.is_some() {
        booking.service = required(patch.service, "service")?;
    }
    if patch.stylist.is_some() {
        booking.stylist = required(patch.stylist, "stylist")?;
    }
    if let Some(customer) = patch.customer {
        if customer.name.is_some() {
            booking.customer.name = required(customer.name, "customer.name")?;
        }
        if customer.phone.is_some() {
            booking.customer.phone = required(customer.phone, "customer.phone")?;
        }
        if let Some(email) = customer.email {
            booking.customer.email = email;
        }
        if let Some(whatsapp) = customer.whatsapp {
            booking.customer.whatsapp = whatsapp;
        }
    }
    if let Some(status) = patch.status {
        if !booking.status.is_active() && status.is_active() {
            return Err(AppError::Validation(
                "a cancelled booking cannot be reopened".to_string(),
            ));
        }
        booking.status = status;
    }
    if let Some(notes) = patch.notes {
        booking.notes = notes;
    }
    if let Some(price) = patch.price {
        booking.price = valid_price(price)?;
    }
    Ok(booking)
}

fn unsaved_booking(booking: NewBooking) -> Booking {
    let now = Utc::now();
    Booking {
        id: format!("mock_{}", now.timestamp_millis()),
        booking_id: booking.booking_id,
        date: booking.date,
        time: booking.time,
        service: booking.service,
        stylist: booking.stylist,
        customer: booking.customer,
        status: booking.status,
        notes: booking.notes,
        price: booking.price,
        created_at: now,
        updated_at: now,
    }
}
