//! Media library queries.

use chrono::Utc;
use la_core::{Error, MediaId, Result, UserId};
use rusqlite::{Connection, OptionalExtension};

use crate::models::{Media, MEDIA_COLUMNS};

/// Register a file in the media library.
pub fn create_media(
    conn: &Connection,
    owner_id: Option<UserId>,
    file_path: &str,
    url: &str,
    mime_type: &str,
) -> Result<Media> {
    let created_at = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO media (owner_id, file_path, url, mime_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![owner_id.map(|id| id.get()), file_path, url, mime_type, created_at],
    )
    .map_err(|e| Error::database(e.to_string()))?;

    Ok(Media {
        id: MediaId::from(conn.last_insert_rowid()),
        owner_id,
        file_path: file_path.to_string(),
        url: url.to_string(),
        mime_type: mime_type.to_string(),
        created_at,
    })
}

pub fn get_media(conn: &Connection, id: MediaId) -> Result<Option<Media>> {
    conn.query_row(
        &format!("SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?1"),
        [id.get()],
        Media::from_row,
    )
    .optional()
    .map_err(|e| Error::database(e.to_string()))
}

pub fn list_media_by_owner(conn: &Connection, owner_id: UserId) -> Result<Vec<Media>> {
    let mut stmt = conn
        .prepare(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE owner_id = ?1 ORDER BY id ASC"
        ))
        .map_err(|e| Error::database(e.to_string()))?;
    let rows = stmt
        .query_map([owner_id.get()], Media::from_row)
        .map_err(|e| Error::database(e.to_string()))?
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(rows)
}

/// Remove a library row. Returns true if a row was deleted.
pub fn delete_media(conn: &Connection, id: MediaId) -> Result<bool> {
    let n = conn
        .execute("DELETE FROM media WHERE id = ?1", [id.get()])
        .map_err(|e| Error::database(e.to_string()))?;
    Ok(n > 0)
}
