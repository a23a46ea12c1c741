//! Avatar record persistence. At most one row per user.

use std::collections::BTreeMap;

use chrono::Utc;
use la_core::{Error, MediaId, Result, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{encode_sizes, AvatarRow, AVATAR_COLUMNS};

pub fn get_avatar(conn: &Connection, user_id: UserId) -> Result<Option<AvatarRow>> {
    conn.query_row(
        &format!("SELECT {AVATAR_COLUMNS} FROM avatars WHERE user_id = ?1"),
        [user_id.get()],
        AvatarRow::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

/// Insert or replace the avatar record for a user.
pub fn upsert_avatar(
    conn: &Connection,
    user_id: UserId,
    source_ref: &str,
    media_id: Option<MediaId>,
    sizes: &BTreeMap<u32, String>,
) -> Result<()> {
    conn.execute(
        "INSERT INTO avatars (user_id, source_ref, media_id, sizes, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT(user_id) DO UPDATE SET
            source_ref = excluded.source_ref,
            media_id   = excluded.media_id,
            sizes      = excluded.sizes,
            updated_at = excluded.updated_at",
        rusqlite::params![
            user_id.get(),
            source_ref,
            media_id.map(|id| id.get()),
            encode_sizes(sizes),
            Utc::now().to_rfc3339(),
        ],
    )
    .map_err(|e| Error::database(e.to_string()))?;
    Ok(())
}

/// Overwrite only the cached variants of an existing record.
pub fn update_sizes(
    conn: &Connection,
    user_id: UserId,
    sizes: &BTreeMap<u32, String>,
) -> Result<bool> {
    let n = conn
        .execute(
            "UPDATE avatars SET sizes = ?1, updated_at = ?2 WHERE user_id = ?3",
            rusqlite::params![encode_sizes(sizes), Utc::now().to_rfc3339(), user_id.get()],
        )
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

pub fn delete_avatar(conn: &Connection, user_id: UserId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM avatars WHERE user_id = ?1", [user_id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}

/// Every stored avatar record.
pub fn list_avatars(conn: &Connection) -> Result<Vec<AvatarRow>> {
    let mut stmt = conn
        .prepare(&format!("SELECT {AVATAR_COLUMNS} FROM avatars ORDER BY user_id ASC"))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([], AvatarRow::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Users whose avatar points at a given library asset.
pub fn users_with_media(conn: &Connection, media_id: MediaId) -> Result<Vec<UserId>> {
    let mut stmt = conn
        .prepare("SELECT user_id FROM avatars WHERE media_id = ?1")
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([media_id.get()], |row| row.get::<_, i64>(0).map(UserId::from))
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}
