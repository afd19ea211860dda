//! User account database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Result as SqliteResult};

use crate::models::{UpdateUserRequest, User, UserRole};
use super::super::sqlite::{enum_column, timestamp, UpdateSet};
use super::super::Database;

const USER_COLUMNS: &str = "id, email, name, password_hash, role, timezone, created_at, updated_at";

fn row_to_user(row: &rusqlite::Row) -> SqliteResult<User> {
    Ok(User {
        id: row.get(0)?,
        email: row.get(1)?,
        name: row.get(2)?,
        password_hash: row.get(3)?,
        role: enum_column(row, 4)?,
        timezone: row.get(5)?,
        created_at: timestamp(row, 6)?,
        updated_at: timestamp(row, 7)?,
    })
}

impl Database {
    /// Create a user. The first account ever created becomes an admin.
    pub fn create_user(
        &self,
        email: &str,
        name: &str,
        password_hash: &str,
        timezone: &str,
    ) -> SqliteResult<User> {
        let conn = self.conn();
        let now = Utc::now().to_rfc3339();

        let existing: i64 = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        let role = if existing == 0 { UserRole::Admin } else { UserRole::User };

        conn.execute(
            "INSERT INTO users (email, name, password_hash, role, timezone, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            rusqlite::params![email.to_lowercase(), name, password_hash, role.as_ref(), timezone, &now],
        )?;
        let id = conn.last_insert_rowid();
        drop(conn);

        self.get_user(id)?.ok_or(rusqlite::Error::QueryReturnedNoRows)
    }

    pub fn get_user(&self, id: i64) -> SqliteResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
            [id],
            row_to_user,
        )
        .optional()
    }

    pub fn get_user_by_email(&self, email: &str) -> SqliteResult<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
            [email.trim().to_lowercase()],
            row_to_user,
        )
        .optional()
    }

    pub fn list_users(&self) -> SqliteResult<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))?;
        let users = stmt.query_map([], row_to_user)?.collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }

    /// Apply a partial profile update. Returns None if the user doesn't exist.
    pub fn update_user(&self, id: i64, request: &UpdateUserRequest) -> SqliteResult<Option<User>> {
        let mut set = UpdateSet::new();
        set.set_opt("name", request.name.as_ref().map(|s| s.trim().to_string()));
        set.set_opt("email", request.email.as_ref().map(|s| s.trim().to_lowercase()));
        set.set_opt("timezone", request.timezone.clone());
        set.set_opt("role", request.role.map(|r| r.as_ref().to_string()));

        if !set.is_empty() {
            let conn = self.conn();
            set.execute(&conn, "users", &[("id", id)])?;
        }
        self.get_user(id)
    }

    pub fn update_password_hash(&self, id: i64, password_hash: &str) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute(
            "UPDATE users SET password_hash = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![password_hash, Utc::now().to_rfc3339(), id],
        )?;
        Ok(rows > 0)
    }

    pub fn delete_user(&self, id: i64) -> SqliteResult<bool> {
        let conn = self.conn();
        let rows = conn.execute("DELETE FROM users WHERE id = ?1", [id])?;
        Ok(rows > 0)
    }
}
