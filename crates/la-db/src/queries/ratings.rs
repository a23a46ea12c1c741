//! Per-user avatar rating.

use la_core::{Error, Rating, Result, UserId};
use rusqlite::{Connection, OptionalExtension};

/// The stored rating, or `None` when the user never set one.
pub fn get_rating(conn: &Connection, user_id: UserId) -> Result<Option<Rating>> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT rating FROM avatar_ratings WHERE user_id = ?1",
            [user_id.get()],
            |row| row.get(0),
        )
        .optional()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(raw.map(|r| Rating::parse_or_default(Some(&r))))
}

pub fn set_rating(conn: &Connection, user_id: UserId, rating: Rating) -> Result<()> {
    conn.execute(
        "INSERT INTO avatar_ratings (user_id, rating) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET rating = excluded.rating",
        rusqlite::params![user_id.get(), rating.as_str()],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

pub fn delete_rating(conn: &Connection, user_id: UserId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM avatar_ratings WHERE user_id = ?1", [user_id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Remove every stored rating.
pub fn delete_all_ratings(conn: &Connection) -> Result<usize> {
    conn.execute("DELETE FROM avatar_ratings", [])
        .map_err(|e| Error::database(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::init_memory_pool;
    use crate::queries::users::create_user;

    #[test]
    fn set_and_overwrite() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let u = create_user(&conn, "a", "a@test", "A", "author").unwrap();

        assert_eq!(get_rating(&conn, u.id).unwrap(), None);
        set_rating(&conn, u.id, Rating::R).unwrap();
        assert_eq!(get_rating(&conn, u.id).unwrap(), Some(Rating::R));
        set_rating(&conn, u.id, Rating::PG).unwrap();
        assert_eq!(get_rating(&conn, u.id).unwrap(), Some(Rating::PG));

        assert!(delete_rating(&conn, u.id).unwrap());
        assert_eq!(get_rating(&conn, u.id).unwrap(), None);
    }

    #[test]
    fn delete_all() {
        let pool = init_memory_pool().unwrap();
        let conn = pool.get().unwrap();
        let a = create_user(&conn, "a", "a@test", "A", "author").unwrap();
        let b = create_user(&conn, "b", "b@test", "B", "author").unwrap();
        set_rating(&conn, a.id, Rating::X).unwrap();
        set_rating(&conn, b.id, Rating::G).unwrap();
        assert_eq!(delete_all_ratings(&conn).unwrap(), 2);
    }
}
