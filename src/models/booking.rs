use chrono::{DateTime, Utc};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Stylist value meaning "no preference".
pub const ANY_STYLIST: &str = "any";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: String,
    pub booking_id: String,
    pub date: String,
    pub time: String,
    pub service: String,
    pub stylist: String,
    pub customer: Customer,
    pub status: BookingStatus,
    pub notes: String,
    pub price: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Customer {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub whatsapp: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(BookingStatus::Pending),
            "confirmed" => Some(BookingStatus::Confirmed),
            "cancelled" => Some(BookingStatus::Cancelled),
            _ => None,
        }
    }

    pub fn is_active(&self) -> bool {
        *self != BookingStatus::Cancelled
    }
}

impl FromSql for BookingStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let s = value.as_str()?;
        BookingStatus::parse(s)
            .ok_or_else(|| FromSqlError::Other(format!("unknown booking status: {s}").into()))
    }
}

impl ToSql for BookingStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

/// How a requested stylist is compared against existing bookings in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WildcardPolicy {
    /// Stylist strings must be identical; `"any"` is its own value.
    Exact,
    /// A request for `"any"` is blocked by every live booking in the slot.
    #[default]
    Occupying,
}

impl WildcardPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "exact" => Some(WildcardPolicy::Exact),
            "occupying" => Some(WildcardPolicy::Occupying),
            _ => None,
        }
    }

    pub fn blocks(&self, requested: &str, existing: &str) -> bool {
        match self {
            WildcardPolicy::Exact => requested == existing,
            WildcardPolicy::Occupying => requested == ANY_STYLIST || requested == existing,
        }
    }
}

/// A validated booking ready to be handed to a store.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBooking {
    pub booking_id: String,
    pub date: String,
    pub time: String,
    pub service: String,
    pub stylist: String,
    pub customer: Customer,
    pub status: BookingStatus,
    pub notes: String,
    pub price: f64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    pub date: Option<String>,
    pub time: Option<String>,
    pub service: Option<String>,
    pub stylist: Option<String>,
    pub customer: Option<CustomerInput>,
    pub booking_id: Option<String>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CustomerInput {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub whatsapp: Option<String>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingPatch {
    pub date: Option<String>,
    pub time: Option<String>,
    pub service: Option<String>,
    pub stylist: Option<String>,
    pub customer: Option<CustomerInput>,
    pub status: Option<BookingStatus>,
    pub notes: Option<String>,
    pub price: Option<f64>,
}
