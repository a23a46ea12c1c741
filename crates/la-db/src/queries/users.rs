//! User CRUD operations.

use chrono::Utc;
use la_core::{Error, Result, UserId};
use rand::RngCore;
use rusqlite::{Connection, OptionalExtension};

use crate::models::{User, USER_COLUMNS};

/// Generate a fresh 32-byte hex API token.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a new user with a freshly generated API token and return it.
///
/// Emails are stored lowercased so lookups by address are case-insensitive.
pub fn create_user(
    conn: &Connection,
    login: &str,
    email: &str,
    display_name: &str,
    role: &str,
) -> Result<User> {
    let email = email.trim().to_ascii_lowercase();
    let api_token = generate_token();
    let created_at = Utc::now().to_rfc3339();

    conn.execute(
        "INSERT INTO users (login, email, display_name, role, api_token, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![login, email, display_name, role, api_token, created_at],
    )
    .map_err(|e| {
        if e.to_string().contains("UNIQUE constraint failed") {
            Error::Conflict(format!("User '{login}' or email '{email}' already exists"))
        } else {
            Error::database(e.to_string())
        }
    })?;

    Ok(User {
        id: UserId::from(conn.last_insert_rowid()),
        login: login.to_string(),
        email,
        display_name: display_name.to_string(),
        role: role.to_string(),
        api_token,
        created_at,
    })
}

fn get_user_where(conn: &Connection, clause: &str, value: &dyn rusqlite::ToSql) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE {clause} = ?1"),
        [value],
        User::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Get a user by primary key.
pub fn get_user_by_id(conn: &Connection, id: UserId) -> Result<Option<User>> {
    get_user_where(conn, "id", &id.get())
}

/// Get a user by email address (case-insensitive).
pub fn get_user_by_email(conn: &Connection, email: &str) -> Result<Option<User>> {
    get_user_where(conn, "email", &email.trim().to_ascii_lowercase())
}

/// Get a user by login name.
pub fn get_user_by_login(conn: &Connection, login: &str) -> Result<Option<User>> {
    get_user_where(conn, "login", &login)
}

/// Get the user owning an API token.
pub fn get_user_by_token(conn: &Connection, token: &str) -> Result<Option<User>> {
    get_user_where(conn, "api_token", &token)
}

/// List all users ordered by login.
pub fn list_users(conn: &Connection) -> Result<Vec<User>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY login ASC"))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], User::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Update a user's role.
pub fn update_user_role(conn: &Connection, id: UserId, role: &str) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE users SET role = ?1 WHERE id = ?2",
            rusqlite::params![role, id.get()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Delete a user by ID. Avatar and rating rows cascade.
pub fn delete_user(conn: &Connection, id: UserId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM users WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;

    #[test]
    fn create_and_get() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();

        let user = create_user(&conn, "alice", "Alice@Example.com", "Alice", "author").unwrap();
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.api_token.len(), 64);

        let by_id = get_user_by_id(&conn, user.id).unwrap().unwrap();
        assert_eq!(by_id.login, "alice");
        assert_eq!(by_id.display_name, "Alice");

        let by_email = get_user_by_email(&conn, "ALICE@example.com").unwrap().unwrap();
        assert_eq!(by_email.id, user.id);

        let by_token = get_user_by_token(&conn, &user.api_token).unwrap().unwrap();
        assert_eq!(by_token.id, user.id);

        assert!(get_user_by_login(&conn, "alice").unwrap().is_some());
    }

    #[test]
    fn missing_user_is_none() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        assert!(get_user_by_id(&conn, UserId::from(999)).unwrap().is_none());
        assert!(get_user_by_token(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn duplicate_login_conflicts() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        create_user(&conn, "bob", "bob@test", "Bob", "subscriber").unwrap();
        let err = create_user(&conn, "bob", "other@test", "Bob", "subscriber").unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn tokens_are_unique() {
        assert_ne!(generate_token(), generate_token());
    }

    #[test]
    fn list_update_and_delete() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let b = create_user(&conn, "bob", "bob@test", "Bob", "subscriber").unwrap();
        create_user(&conn, "alice", "alice@test", "Alice", "editor").unwrap();

        let users = list_users(&conn).unwrap();
        assert_eq!(users[0].login, "alice");
        assert_eq!(users.len(), 2);

        assert!(update_user_role(&conn, b.id, "author").unwrap());
        assert_eq!(get_user_by_id(&conn, b.id).unwrap().unwrap().role, "author");

        assert!(delete_user(&conn, b.id).unwrap());
        assert!(!delete_user(&conn, b.id).unwrap());
    }
}
