//! v001 -- Initial schema creation.
//!
//! Creates the five core tables: `users`, `properties`, `rooms`, `bookings`
//! and `booking_history`.

use rusqlite::Connection;

/// SQL executed when upgrading from version 0 to version 1.
const UP_SQL: &str = r#"
-- ----------------------------------------------------------------
-- Users
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS users (
    id         TEXT PRIMARY KEY NOT NULL,     -- UUID v4
    name       TEXT NOT NULL,
    email      TEXT UNIQUE,                   -- lowercased, nullable
    phone      TEXT,
    role       TEXT NOT NULL
               CHECK (role IN ('guest', 'host', 'agent', 'admin')),
    created_at TEXT NOT NULL                  -- RFC-3339
);

-- ----------------------------------------------------------------
-- Properties (host listings)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS properties (
    id            TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    host_id       TEXT NOT NULL,              -- FK -> users(id)
    name          TEXT NOT NULL,
    address_line1 TEXT NOT NULL DEFAULT '',
    address_line2 TEXT,
    city          TEXT NOT NULL DEFAULT '',
    state         TEXT NOT NULL DEFAULT '',
    postal_code   TEXT NOT NULL DEFAULT '',
    country       TEXT NOT NULL DEFAULT '',
    pricing_mode  TEXT NOT NULL
                  CHECK (pricing_mode IN ('perRoom', 'perPerson')),
    pricing_value INTEGER,                    -- optional flat value
    slug          TEXT NOT NULL UNIQUE,
    total_rooms   INTEGER NOT NULL DEFAULT 0,
    is_active     INTEGER NOT NULL DEFAULT 1, -- boolean 0/1
    is_verified   INTEGER NOT NULL DEFAULT 0, -- boolean 0/1
    created_at    TEXT NOT NULL,
    updated_at    TEXT NOT NULL,

    FOREIGN KEY (host_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_properties_host ON properties(host_id);

-- ----------------------------------------------------------------
-- Rooms
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS rooms (
    id                TEXT PRIMARY KEY NOT NULL,  -- UUID v4
    property_id       TEXT NOT NULL,              -- FK -> properties(id)
    category          TEXT NOT NULL,
    room_number       TEXT NOT NULL,
    capacity_adults   INTEGER NOT NULL DEFAULT 0,
    capacity_children INTEGER NOT NULL DEFAULT 0,
    capacity_total    INTEGER NOT NULL DEFAULT 0,
    pricing           TEXT NOT NULL,              -- JSON, tagged by mode
    advance_amount    INTEGER,                    -- optional flat advance
    amenities         TEXT NOT NULL DEFAULT '[]', -- JSON array
    images            TEXT NOT NULL DEFAULT '[]', -- JSON array of URLs
    is_active         INTEGER NOT NULL DEFAULT 1,
    is_available      INTEGER NOT NULL DEFAULT 1,
    created_at        TEXT NOT NULL,
    updated_at        TEXT NOT NULL,

    FOREIGN KEY (property_id) REFERENCES properties(id) ON DELETE CASCADE
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_rooms_unique_number
    ON rooms(property_id, category, room_number);

-- ----------------------------------------------------------------
-- Bookings
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS bookings (
    id               TEXT PRIMARY KEY NOT NULL,   -- UUID v4
    reference        TEXT NOT NULL UNIQUE,
    property_id      TEXT NOT NULL,               -- FK -> properties(id)
    room_id          TEXT NOT NULL,               -- FK -> rooms(id)
    user_id          TEXT,                        -- nullable FK -> users(id)
    guest_name       TEXT NOT NULL,
    guest_phone      TEXT NOT NULL,
    guest_email      TEXT,
    check_in         TEXT NOT NULL,               -- RFC-3339, UTC, millis
    check_out        TEXT NOT NULL,
    adults           INTEGER NOT NULL CHECK (adults >= 1),
    younger_children INTEGER NOT NULL DEFAULT 0 CHECK (younger_children >= 0),
    older_children   INTEGER NOT NULL DEFAULT 0 CHECK (older_children >= 0),
    rate             INTEGER NOT NULL,
    nights           INTEGER NOT NULL,
    total_amount     INTEGER NOT NULL,
    advance_amount   INTEGER NOT NULL,
    balance_amount   INTEGER NOT NULL,
    status           TEXT NOT NULL
                     CHECK (status IN ('pending', 'confirmed', 'checked-in',
                                       'checked-out', 'cancelled', 'no-show',
                                       'declined')),
    special_requests TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL,

    CHECK (check_out > check_in),
    FOREIGN KEY (property_id) REFERENCES properties(id),
    FOREIGN KEY (room_id) REFERENCES rooms(id),
    FOREIGN KEY (user_id) REFERENCES users(id)
);

CREATE INDEX IF NOT EXISTS idx_bookings_room_dates
    ON bookings(room_id, check_in, check_out);
CREATE INDEX IF NOT EXISTS idx_bookings_property ON bookings(property_id, check_in);
CREATE INDEX IF NOT EXISTS idx_bookings_user ON bookings(user_id);

-- ----------------------------------------------------------------
-- Booking history (append-only audit log)
-- ----------------------------------------------------------------
CREATE TABLE IF NOT EXISTS booking_history (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    booking_id   TEXT NOT NULL,                   -- FK -> bookings(id)
    action       TEXT NOT NULL
                 CHECK (action IN ('created', 'modified', 'cancelled')),
    status       TEXT NOT NULL,                   -- status after the action
    performed_by TEXT,                            -- user id, NULL = anonymous
    details      TEXT NOT NULL DEFAULT '',
    created_at   TEXT NOT NULL,

    FOREIGN KEY (booking_id) REFERENCES bookings(id)
);

CREATE INDEX IF NOT EXISTS idx_history_booking ON booking_history(booking_id, id);
"#;

/// Apply the initial migration.
pub fn up(conn: &Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(UP_SQL)
}
