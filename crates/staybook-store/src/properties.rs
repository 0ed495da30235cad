//! CRUD operations for [`Property`] records.

use rusqlite::params;
use uuid::Uuid;

use staybook_shared::Address;

use crate::codec::{fmt_ts, money, opt_money_at, parsed_at, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{classify, not_found, Result};
use crate::models::{Property, StoreCounts};

const PROPERTY_COLUMNS: &str = "id, host_id, name, address_line1, address_line2, city, state,
     postal_code, country, pricing_mode, pricing_value, slug, total_rooms,
     is_active, is_verified, created_at, updated_at";

impl Database {
    // ------------------------------------------------------------------
    // Create
    // ------------------------------------------------------------------

    /// Insert a new property. A taken slug yields [`StoreError::Duplicate`].
    ///
    /// [`StoreError::Duplicate`]: crate::StoreError::Duplicate
    pub fn create_property(&self, property: &Property) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO properties (id, host_id, name, address_line1, address_line2,
                     city, state, postal_code, country, pricing_mode, pricing_value, slug,
                     total_rooms, is_active, is_verified, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
                params![
                    property.id.to_string(),
                    property.host_id.to_string(),
                    property.name,
                    property.address.line1,
                    property.address.line2,
                    property.address.city,
                    property.address.state,
                    property.address.postal_code,
                    property.address.country,
                    property.pricing_mode.as_str(),
                    property.pricing_value.map(money),
                    property.slug,
                    property.total_rooms,
                    property.is_active,
                    property.is_verified,
                    fmt_ts(&property.created_at),
                    fmt_ts(&property.updated_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Read
    // ------------------------------------------------------------------

    pub fn get_property(&self, id: Uuid) -> Result<Property> {
        self.conn()
            .query_row(
                &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE id = ?1"),
                params![id.to_string()],
                row_to_property,
            )
            .map_err(not_found)
    }

    pub fn get_property_by_slug(&self, slug: &str) -> Result<Property> {
        self.conn()
            .query_row(
                &format!("SELECT {PROPERTY_COLUMNS} FROM properties WHERE slug = ?1"),
                params![slug],
                row_to_property,
            )
            .map_err(not_found)
    }

    pub fn slug_exists(&self, slug: &str) -> Result<bool> {
        let exists = self.conn().query_row(
            "SELECT EXISTS (SELECT 1 FROM properties WHERE slug = ?1)",
            params![slug],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// List a host's properties, ordered by name.
    pub fn list_properties_for_host(&self, host_id: Uuid) -> Result<Vec<Property>> {
        let mut stmt = self.conn().prepare(&format!(
            "SELECT {PROPERTY_COLUMNS} FROM properties
             WHERE host_id = ?1
             ORDER BY name ASC"
        ))?;

        let rows = stmt.query_map(params![host_id.to_string()], row_to_property)?;

        let mut properties = Vec::new();
        for row in rows {
            properties.push(row?);
        }
        Ok(properties)
    }

    /// Number of rooms actually attached to a property.
    pub fn count_rooms(&self, property_id: Uuid) -> Result<u32> {
        let count = self.conn().query_row(
            "SELECT COUNT(*) FROM rooms WHERE property_id = ?1",
            params![property_id.to_string()],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Row counts across the main tables.
    pub fn counts(&self) -> Result<StoreCounts> {
        let count = |table: &str| -> Result<u64> {
            let n: i64 =
                self.conn()
                    .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
            Ok(u64::try_from(n).unwrap_or(0))
        };
        Ok(StoreCounts {
            users: count("users")?,
            properties: count("properties")?,
            rooms: count("rooms")?,
            bookings: count("bookings")?,
        })
    }

    // ------------------------------------------------------------------
    // Update
    // ------------------------------------------------------------------

    /// Persist the mutable fields of a property. Ownership, slug and pricing
    /// mode never change after creation.
    pub fn update_property(&self, property: &Property) -> Result<()> {
        let affected = self.conn().execute(
            "UPDATE properties
             SET name = ?2, address_line1 = ?3, address_line2 = ?4, city = ?5, state = ?6,
                 postal_code = ?7, country = ?8, pricing_value = ?9, total_rooms = ?10,
                 is_active = ?11, is_verified = ?12, updated_at = ?13
             WHERE id = ?1",
            params![
                property.id.to_string(),
                property.name,
                property.address.line1,
                property.address.line2,
                property.address.city,
                property.address.state,
                property.address.postal_code,
                property.address.country,
                property.pricing_value.map(money),
                property.total_rooms,
                property.is_active,
                property.is_verified,
                fmt_ts(&property.updated_at),
            ],
        )?;
        if affected == 0 {
            return Err(crate::StoreError::NotFound);
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn row_to_property(row: &rusqlite::Row<'_>) -> rusqlite::Result<Property> {
    Ok(Property {
        id: uuid_at(row, 0)?,
        host_id: uuid_at(row, 1)?,
        name: row.get(2)?,
        address: Address {
            line1: row.get(3)?,
            line2: row.get(4)?,
            city: row.get(5)?,
            state: row.get(6)?,
            postal_code: row.get(7)?,
            country: row.get(8)?,
        },
        pricing_mode: parsed_at(row, 9)?,
        pricing_value: opt_money_at(row, 10)?,
        slug: row.get(11)?,
        total_rooms: row.get(12)?,
        is_active: row.get(13)?,
        is_verified: row.get(14)?,
        created_at: ts_at(row, 15)?,
        updated_at: ts_at(row, 16)?,
    })
}
