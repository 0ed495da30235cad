//! CRUD operations for [`User`] records.

use rusqlite::{params, OptionalExtension};
use uuid::Uuid;

use crate::codec::{fmt_ts, parsed_at, ts_at, uuid_at};
use crate::database::Database;
use crate::error::{classify, not_found, Result};
use crate::models::User;

const USER_COLUMNS: &str = "id, name, email, phone, role, created_at";

impl Database {
    /// Insert a new user. A taken email yields [`StoreError::Duplicate`].
    ///
    /// [`StoreError::Duplicate`]: crate::StoreError::Duplicate
    pub fn create_user(&self, user: &User) -> Result<()> {
        self.conn()
            .execute(
                "INSERT INTO users (id, name, email, phone, role, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    user.id.to_string(),
                    user.name,
                    user.email.as_deref().map(str::to_lowercase),
                    user.phone,
                    user.role.as_str(),
                    fmt_ts(&user.created_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn get_user(&self, id: Uuid) -> Result<User> {
        self.conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
                params![id.to_string()],
                row_to_user,
            )
            .map_err(not_found)
    }

    /// Case-insensitive lookup by email.
    pub fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = self
            .conn()
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE email = ?1"),
                params![email.trim().to_lowercase()],
                row_to_user,
            )
            .optional()?;
        Ok(user)
    }
}

fn row_to_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: uuid_at(row, 0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        phone: row.get(3)?,
        role: parsed_at(row, 4)?,
        created_at: ts_at(row, 5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::StoreError;
    use chrono::Utc;
    use staybook_shared::UserRole;

    fn user(email: Option<&str>, role: UserRole) -> User {
        User {
            id: Uuid::new_v4(),
            name: "Asha".into(),
            email: email.map(String::from),
            phone: Some("+91 90000 00000".into()),
            role,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn create_and_fetch() {
        let db = Database::open_in_memory().unwrap();
        let u = user(Some("Asha@Example.com"), UserRole::Host);
        db.create_user(&u).unwrap();

        let fetched = db.get_user(u.id).unwrap();
        assert_eq!(fetched.role, UserRole::Host);
        assert_eq!(fetched.email.as_deref(), Some("asha@example.com"));

        let by_email = db.find_user_by_email(" ASHA@example.COM ").unwrap();
        assert_eq!(by_email.map(|u| u.id), Some(u.id));
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user(Some("a@b.c"), UserRole::Guest)).unwrap();
        let err = db
            .create_user(&user(Some("A@B.C"), UserRole::Guest))
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(ref cols) if cols == "users.email"));
    }

    #[test]
    fn users_without_email_do_not_collide() {
        let db = Database::open_in_memory().unwrap();
        db.create_user(&user(None, UserRole::Guest)).unwrap();
        db.create_user(&user(None, UserRole::Guest)).unwrap();
    }

    #[test]
    fn missing_user() {
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(db.get_user(Uuid::new_v4()), Err(StoreError::NotFound)));
        assert!(db.find_user_by_email("nobody@x.y").unwrap().is_none());
    }
}
