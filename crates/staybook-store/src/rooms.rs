//! CRUD operations for [`Room`] records.

use rusqlite::params;
use uuid::Uuid;

use staybook_shared::Capacity;

use crate::codec::{fmt_ts, json_at, money, opt_money_at, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{classify, not_found, Result, StoreError};
use crate::models::Room;

const ROOM_COLUMNS: &str = "id, property_id, category, room_number, capacity_adults,
     capacity_children, capacity_total, pricing, advance_amount, amenities, images,
     is_active, is_available, created_at, updated_at";

impl Database {
    /// Insert a new room. A (property, category, room number) clash yields
    /// [`StoreError::Duplicate`].
    pub fn create_room(&self, room: &Room) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO rooms (id, property_id, category, room_number, capacity_adults,
                     capacity_children, capacity_total, pricing, advance_amount, amenities,
                     images, is_active, is_available, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                params![
                    room.id.to_string(),
                    room.property_id.to_string(),
                    room.category,
                    room.room_number,
                    room.capacity.adults,
                    room.capacity.children,
                    room.capacity.total,
                    serde_json::to_string(&room.pricing)?,
                    room.advance_amount.map(money),
                    serde_json::to_string(&room.amenities)?,
                    serde_json::to_string(&room.images)?,
                    room.is_active,
                    room.is_available,
                    fmt_ts(&room.created_at),
                    fmt_ts(&room.updated_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn get_room(&self, id: Uuid) -> Result<Room> {
        self.conn()
            .query_row(
                &format!("SELECT {ROOM_COLUMNS} FROM rooms WHERE id = ?1"),
                params![id.to_string()],
                row_to_room,
            )
            .map_err(not_found)
    }

    /// List a property's rooms ordered by category then number. With
    /// `bookable_only`, inactive and unavailable rooms are skipped.
    pub fn list_rooms_for_property(&self, property_id: Uuid, bookable_only: bool) -> Result<Vec<Room>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {ROOM_COLUMNS} FROM rooms
             WHERE property_id = ?1
               AND (?2 = 0 OR (is_active = 1 AND is_available = 1))
             ORDER BY category ASC, room_number ASC"
        ))?;

        let rows = stmt.query_map(params![property_id.to_string(), bookable_only], row_to_room)?;

        let mut rooms = Vec::new();
        for row in rows {
            rooms.push(row?);
        }
        Ok(rooms)
    }

    /// Persist the mutable fields of a room. The owning property never
    /// changes.
    pub fn update_room(&self, room: &Room) -> Result<()> {
        let affected = self
            .conn()
            .execute(
                "UPDATE rooms
                 SET category = ?2, room_number = ?3, capacity_adults = ?4,
                     capacity_children = ?5, capacity_total = ?6, pricing = ?7,
                     advance_amount = ?8, amenities = ?9, images = ?10, is_active = ?11,
                     is_available = ?12, updated_at = ?13
                 WHERE id = ?1",
                params![
                    room.id.to_string(),
                    room.category,
                    room.room_number,
                    room.capacity.adults,
                    room.capacity.children,
                    room.capacity.total,
                    serde_json::to_string(&room.pricing)?,
                    room.advance_amount.map(money),
                    serde_json::to_string(&room.amenities)?,
                    serde_json::to_string(&room.images)?,
                    room.is_active,
                    room.is_available,
                    fmt_ts(&room.updated_at),
                ],
            )
            .map_err(classify)?;
        if affected == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}

fn row_to_room(row: &rusqlite::Row<'_>) -> rusqlite::Result<Room> {
    Ok(Room {
        id: uuid_at(row, 0)?,
        property_id: uuid_at(row, 1)?,
        category: row.get(2)?,
        room_number: row.get(3)?,
        capacity: Capacity {
            adults: row.get(4)?,
            children: row.get(5)?,
            total: row.get(6)?,
        },
        pricing: json_at(row, 7)?,
        advance_amount: opt_money_at(row, 8)?,
        amenities: json_at(row, 9)?,
        images: json_at(row, 10)?,
        is_active: row.get(11)?,
        is_available: row.get(12)?,
        created_at: ts_at(row, 13)?,
        updated_at: ts_at(row, 14)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use staybook_shared::{PricingMode, RoomPricing};

    #[test]
    fn pricing_and_lists_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let host = fixtures::host(&db);
        let property = fixtures::property(&db, host.id, "Per Person", PricingMode::PerPerson);

        let mut room = fixtures::room_value(&property, "201");
        room.pricing = RoomPricing::PerPerson {
            adult_rate: 800,
            child_rate: None,
        };
        room.amenities = vec!["wifi".into(), "balcony".into()];
        room.images = vec!["https://cdn.example/201.jpg".into()];
        room.advance_amount = Some(500);
        db.create_room(&room).unwrap();

        assert_eq!(db.get_room(room.id).unwrap(), room);
    }

    #[test]
    fn room_number_unique_within_category() {
        let db = Database::open_in_memory().unwrap();
        let host = fixtures::host(&db);
        let property = fixtures::property(&db, host.id, "Clash", PricingMode::PerRoom);
        fixtures::room(&db, &property, "101");

        let mut same = fixtures::room_value(&property, "101");
        let err = db.create_room(&same).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));

        // Same number in a different category is fine.
        same.category = "Suite".into();
        db.create_room(&same).unwrap();
    }

    #[test]
    fn bookable_filter() {
        let db = Database::open_in_memory().unwrap();
        let host = fixtures::host(&db);
        let property = fixtures::property(&db, host.id, "Filter", PricingMode::PerRoom);
        let open = fixtures::room(&db, &property, "101");
        let mut closed = fixtures::room(&db, &property, "102");
        closed.is_available = false;
        db.update_room(&closed).unwrap();

        let all = db.list_rooms_for_property(property.id, false).unwrap();
        assert_eq!(all.len(), 2);

        let bookable = db.list_rooms_for_property(property.id, true).unwrap();
        assert_eq!(bookable.len(), 1);
        assert_eq!(bookable[0].id, open.id);
    }

    #[test]
    fn missing_room() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_room(Uuid::new_v4()), Err(StoreError::NotFound)));
    }
}
