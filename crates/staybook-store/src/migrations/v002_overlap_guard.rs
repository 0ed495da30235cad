//! v002 -- Storage-level booking guards.
//!
//! An active booking (any status but `cancelled`/`declined`) may not overlap
//! another active booking of the same room. The triggers make the check and
//! the write a single statement, so two racing submissions cannot both land.
//! History rows are immutable once written.

use rusqlite::Connection;

const UP_SQL: &str = r#"
CREATE TRIGGER IF NOT EXISTS trg_bookings_overlap_insert
BEFORE INSERT ON bookings
WHEN NEW.status NOT IN ('cancelled', 'declined')
BEGIN
    SELECT RAISE(ABORT, 'booking_overlap')
    WHERE EXISTS (
        SELECT 1 FROM bookings b
        WHERE b.room_id = NEW.room_id
          AND b.status NOT IN ('cancelled', 'declined')
          AND b.check_in < NEW.check_out
          AND b.check_out > NEW.check_in
    );
END;

CREATE TRIGGER IF NOT EXISTS trg_bookings_overlap_update
BEFORE UPDATE OF status, room_id, check_in, check_out ON bookings
WHEN NEW.status NOT IN ('cancelled', 'declined')
BEGIN
    SELECT RAISE(ABORT, 'booking_overlap')
    WHERE EXISTS (
        SELECT 1 FROM bookings b
        WHERE b.room_id = NEW.room_id
          AND b.id <> NEW.id
          AND b.status NOT IN ('cancelled', 'declined')
          AND b.check_in < NEW.check_out
          AND b.check_out > NEW.check_in
    );
END;

CREATE TRIGGER IF NOT EXISTS trg_history_no_update
BEFORE UPDATE ON booking_history
BEGIN
    SELECT RAISE(ABORT, 'booking_history is append-only');
END;

CREATE TRIGGER IF NOT EXISTS trg_history_no_delete
BEFORE DELETE ON booking_history
BEGIN
    SELECT RAISE(ABORT, 'booking_history is append-only');
END;
"#;

pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
