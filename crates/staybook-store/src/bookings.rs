//! Booking persistence and the availability query.
//!
//! Inserts and status changes run inside `IMMEDIATE` transactions. Together
//! with the v002 overlap triggers this closes the gap between "check the
//! room is free" and "write the booking": a second writer blocks until the
//! first commits, then sees its row.

use rusqlite::{params, Connection, TransactionBehavior};
use uuid::Uuid;

use staybook_shared::{BookingStatus, DateRange, GuestComposition, GuestContact, PriceBreakdown};

use crate::codec::{fmt_ts, money, money_at, opt_uuid_at, parsed_at, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{classify, not_found, Result, StoreError};
use crate::models::{Booking, HistoryEntry};

const BOOKING_COLUMNS: &str = "id, reference, property_id, room_id, user_id, guest_name,
     guest_phone, guest_email, check_in, check_out, adults, younger_children,
     older_children, rate, nights, total_amount, advance_amount, balance_amount,
     status, special_requests, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Availability
    // ------------------------------------------------------------------

    /// Whether any active booking of `room_id` overlaps `stay`.
    pub fn has_conflict(&self, room_id: Uuid, stay: &DateRange) -> Result<bool> {
        Ok(!overlapping_stays(self.conn(), room_id, stay)?.is_empty())
    }

    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Atomically check availability and insert a booking with its history.
    ///
    /// Fails with [`StoreError::Overlap`] when the room is taken, and with
    /// [`StoreError::Duplicate`] when the reference already exists.
    pub fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        if booking.status.holds_room()
            && !overlapping_stays(&tx, booking.room_id, &booking.stay)?.is_empty()
        {
            return Err(StoreError::Overlap);
        }

        tx.execute(
            &format!(
                "INSERT INTO bookings ({BOOKING_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14,
                         ?15, ?16, ?17, ?18, ?19, ?20, ?21, ?22)"
            ),
            params![
                booking.id.to_string(),
                booking.reference,
                booking.property_id.to_string(),
                booking.room_id.to_string(),
                booking.user_id.map(|u| u.to_string()),
                booking.guest.name,
                booking.guest.phone,
                booking.guest.email,
                fmt_ts(&booking.stay.check_in),
                fmt_ts(&booking.stay.check_out),
                booking.guests.adults,
                booking.guests.younger_children,
                booking.guests.older_children,
                money(booking.price.rate),
                booking.price.nights,
                money(booking.price.total_amount),
                money(booking.price.advance_amount),
                money(booking.price.balance_amount),
                booking.status.as_str(),
                booking.special_requests,
                fmt_ts(&booking.created_at),
                fmt_ts(&booking.updated_at),
            ],
        )
        .map_err(classify)?;

        for entry in &booking.history {
            append_history(&tx, booking.id, entry)?;
        }

        tx.commit()?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    /// Fetch a booking together with its history.
    pub fn get_booking(&self, id: Uuid) -> Result<Booking> {
        let mut booking = self
            .conn()
            .query_row(
                &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
                params![id.to_string()],
                row_to_booking,
            )
            .map_err(not_found)?;
        booking.history = self.booking_history(id)?;
        Ok(booking)
    }

    /// All bookings of a property, by check-in date.
    pub fn list_bookings_for_property(&self, property_id: Uuid) -> Result<Vec<Booking>> {
        self.list_bookings_where("property_id = ?1", property_id)
    }

    /// All bookings made by a registered user, by check-in date.
    pub fn list_bookings_for_user(&self, user_id: Uuid) -> Result<Vec<Booking>> {
        self.list_bookings_where("user_id = ?1", user_id)
    }

    fn list_bookings_where(&self, filter: &str, id: Uuid) -> Result<Vec<Booking>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE {filter}
             ORDER BY check_in ASC, created_at ASC"
        ))?;

        let rows = stmt.query_map(params![id.to_string()], row_to_booking)?;

        let mut bookings = Vec::new();
        for row in rows {
            let mut booking = row?;
            booking.history = self.booking_history(booking.id)?;
            bookings.push(booking);
        }
        Ok(bookings)
    }

    /// History of a booking, oldest first.
    pub fn booking_history(&self, booking_id: Uuid) -> Result<Vec<HistoryEntry>> {
        let mut stmt = self.conn().prepare(
            "SELECT action, status, performed_by, details, created_at
             FROM booking_history
             WHERE booking_id = ?1
             ORDER BY id ASC",
        )?;

        let rows = stmt.query_map(params![booking_id.to_string()], |row| {
            Ok(HistoryEntry {
                action: parsed_at(row, 0)?,
                status: parsed_at(row, 1)?,
                performed_by: opt_uuid_at(row, 2)?,
                details: row.get(3)?,
                timestamp: ts_at(row, 4)?,
            })
        })?;

        let mut history = Vec::new();
        for row in rows {
            history.push(row?);
        }
        Ok(history)
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Move a booking from `from` to `entry.status` and append `entry`.
    ///
    /// The update only applies while the booking is still in `from`;
    /// otherwise [`StoreError::StaleStatus`] is returned and nothing changes.
    pub fn transition_booking(
        &mut self,
        id: Uuid,
        from: BookingStatus,
        entry: &HistoryEntry,
    ) -> Result<Booking> {
        let tx = self
            .conn_mut()
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let affected = tx
            .execute(
                "UPDATE bookings SET status = ?3, updated_at = ?4
                 WHERE id = ?1 AND status = ?2",
                params![
                    id.to_string(),
                    from.as_str(),
                    entry.status.as_str(),
                    fmt_ts(&entry.timestamp),
                ],
            )
            .map_err(classify)?;

        if affected == 0 {
            let exists: bool = tx.query_row(
                "SELECT EXISTS (SELECT 1 FROM bookings WHERE id = ?1)",
                params![id.to_string()],
                |row| row.get(0),
            )?;
            return Err(if exists {
                StoreError::StaleStatus
            } else {
                StoreError::NotFound
            });
        }

        append_history(&tx, id, entry)?;
        tx.commit()?;

        self.get_booking(id)
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Active stays of `room_id` overlapping `stay`.
fn overlapping_stays(conn: &Connection, room_id: Uuid, stay: &DateRange) -> Result<Vec<DateRange>> {
    let mut stmt = conn.prepare(
        "SELECT check_in, check_out FROM bookings
         WHERE room_id = ?1
           AND status NOT IN ('cancelled', 'declined')
           AND check_in < ?2",
    )?;

    let rows = stmt.query_map(
        params![room_id.to_string(), fmt_ts(&stay.check_out)],
        |row| {
            Ok(DateRange {
                check_in: ts_at(row, 0)?,
                check_out: ts_at(row, 1)?,
            })
        },
    )?;

    let mut overlapping = Vec::new();
    for row in rows {
        let existing = row?;
        if existing.overlaps(stay) {
            overlapping.push(existing);
        }
    }
    Ok(overlapping)
}

fn append_history(conn: &Connection, booking_id: Uuid, entry: &HistoryEntry) -> Result<()> {
    conn.execute(
        "INSERT INTO booking_history (booking_id, action, status, performed_by, details, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            booking_id.to_string(),
            entry.action.as_str(),
            entry.status.as_str(),
            entry.performed_by.map(|u| u.to_string()),
            entry.details,
            fmt_ts(&entry.timestamp),
        ],
    )?;
    Ok(())
}

fn row_to_booking(row: &rusqlite::Row<'_>) -> rusqlite::Result<Booking> {
    Ok(Booking {
        id: uuid_at(row, 0)?,
        reference: row.get(1)?,
        property_id: uuid_at(row, 2)?,
        room_id: uuid_at(row, 3)?,
        user_id: opt_uuid_at(row, 4)?,
        guest: GuestContact {
            name: row.get(5)?,
            phone: row.get(6)?,
            email: row.get(7)?,
        },
        stay: DateRange {
            check_in: ts_at(row, 8)?,
            check_out: ts_at(row, 9)?,
        },
        guests: GuestComposition {
            adults: row.get(10)?,
            younger_children: row.get(11)?,
            older_children: row.get(12)?,
        },
        price: PriceBreakdown {
            rate: money_at(row, 13)?,
            nights: row.get(14)?,
            total_amount: money_at(row, 15)?,
            advance_amount: money_at(row, 16)?,
            balance_amount: money_at(row, 17)?,
        },
        status: parsed_at(row, 18)?,
        special_requests: row.get(19)?,
        history: Vec::new(),
        created_at: ts_at(row, 20)?,
        updated_at: ts_at(row, 21)?,
    })
}
