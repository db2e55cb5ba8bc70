use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::models::{
    BookedSlot, Booking, BookingStatus, Customer, NewBooking, WildcardPolicy, ANY_STYLIST,
};

const BOOKING_COLUMNS: &str = "id, booking_id, date, time, service, stylist, \
     customer_name, customer_phone, customer_email, customer_whatsapp, \
     status, notes, price, created_at, updated_at";

// ── Bookings ──

/// Inserts `booking` in a single statement guarded by the slot check.
/// Returns `false` when a live booking already blocks the slot.
pub fn insert_booking_if_slot_free(
    conn: &Connection,
    id: &str,
    booking: &NewBooking,
    policy: WildcardPolicy,
    now: &DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let occupying = policy == WildcardPolicy::Occupying;
    let count = conn.execute(
        "INSERT INTO bookings (id, booking_id, date, time, service, stylist,
             customer_name, customer_phone, customer_email, customer_whatsapp,
             status, notes, price, created_at, updated_at)
         SELECT ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14
         WHERE NOT EXISTS (
             SELECT 1 FROM bookings
             WHERE date = ?3 AND time = ?4 AND status != 'cancelled'
               AND (stylist = ?6 OR (?15 AND ?6 = ?16))
         )",
        params![
            id,
            booking.booking_id,
            booking.date,
            booking.time,
            booking.service,
            booking.stylist,
            booking.customer.name,
            booking.customer.phone,
            booking.customer.email,
            booking.customer.whatsapp,
            booking.status,
            booking.notes,
            booking.price,
            now,
            occupying,
            ANY_STYLIST,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_all_bookings(conn: &Connection) -> rusqlite::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map([], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn get_booked_slots(conn: &Connection, date: &str) -> rusqlite::Result<Vec<BookedSlot>> {
    let mut stmt = conn.prepare(
        "SELECT time, stylist FROM bookings
         WHERE date = ?1 AND status != 'cancelled'
         ORDER BY time ASC, stylist ASC",
    )?;

    let rows = stmt.query_map(params![date], |row| {
        Ok(BookedSlot {
            time: row.get(0)?,
            stylist: row.get(1)?,
        })
    })?;

    let mut slots = vec![];
    for row in rows {
        slots.push(row?);
    }
    Ok(slots)
}

/// Resolves a path key to a single record id. A record `id` wins over a
/// `bookingId` with the same text.
pub fn resolve_booking_id(conn: &Connection, key: &str) -> rusqlite::Result<Option<String>> {
    let by_record = conn
        .query_row("SELECT id FROM bookings WHERE id = ?1", params![key], |row| row.get(0))
        .optional()?;
    if by_record.is_some() {
        return Ok(by_record);
    }
    conn.query_row(
        "SELECT id FROM bookings WHERE booking_id = ?1",
        params![key],
        |row| row.get(0),
    )
    .optional()
}

pub fn record_id_exists(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    conn.query_row("SELECT EXISTS(SELECT 1 FROM bookings WHERE id = ?1)", params![id], |row| {
        row.get(0)
    })
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> rusqlite::Result<Option<Booking>> {
    conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        parse_booking_row,
    )
    .optional()
}

/// Looks a booking up by record id or, failing that, by its `bookingId`.
pub fn find_booking(conn: &Connection, key: &str) -> rusqlite::Result<Option<Booking>> {
    match resolve_booking_id(conn, key)? {
        Some(id) => get_booking_by_id(conn, &id),
        None => Ok(None),
    }
}

/// Overwrites every mutable column of the row identified by `booking.id`,
/// unless the new slot is held by another live booking under `policy`.
/// Returns `false` when no row was written.
pub fn update_booking(
    conn: &Connection,
    booking: &Booking,
    policy: WildcardPolicy,
    now: &DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let occupying = policy == WildcardPolicy::Occupying;
    let count = conn.execute(
        "UPDATE bookings SET
             date = ?1, time = ?2, service = ?3, stylist = ?4,
             customer_name = ?5, customer_phone = ?6, customer_email = ?7, customer_whatsapp = ?8,
             status = ?9, notes = ?10, price = ?11, updated_at = ?12
         WHERE id = ?13
           AND (?9 = 'cancelled' OR NOT EXISTS (
               SELECT 1 FROM bookings AS other
               WHERE other.id != ?13 AND other.date = ?1 AND other.time = ?2
                 AND other.status != 'cancelled'
                 AND (other.stylist = ?4 OR (?14 AND ?4 = ?15))
           ))",
        params![
            booking.date,
            booking.time,
            booking.service,
            booking.stylist,
            booking.customer.name,
            booking.customer.phone,
            booking.customer.email,
            booking.customer.whatsapp,
            booking.status,
            booking.notes,
            booking.price,
            now,
            booking.id,
            occupying,
            ANY_STYLIST,
        ],
    )?;
    Ok(count > 0)
}

/// `id` is a record id; see [`resolve_booking_id`].
pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
    now: &DateTime<Utc>,
) -> rusqlite::Result<bool> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status, now, id],
    )?;
    Ok(count > 0)
}

pub fn delete_booking(conn: &Connection, id: &str) -> rusqlite::Result<bool> {
    let count = conn.execute("DELETE FROM bookings WHERE id = ?1", params![id])?;
    Ok(count > 0)
}

fn parse_booking_row(row: &Row) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: row.get(0)?,
        booking_id: row.get(1)?,
        date: row.get(2)?,
        time: row.get(3)?,
        service: row.get(4)?,
        stylist: row.get(5)?,
        customer: Customer {
            name: row.get(6)?,
            phone: row.get(7)?,
            email: row.get(8)?,
            whatsapp: row.get(9)?,
        },
        status: row.get(10)?,
        notes: row.get(11)?,
        price: row.get(12)?,
        created_at: row.get(13)?,
        updated_at: row.get(14)?,
    })
}
