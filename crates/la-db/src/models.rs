//! Rust structs mapping to database tables.
//!
//! Each model implements `from_row` for constructing itself from a
//! `rusqlite::Row`. Column order matches the `*_COLUMNS` constants used by
//! the query modules.

use std::collections::BTreeMap;

use la_core::{MediaId, UserId};

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

pub const USER_COLUMNS: &str = "id, login, email, display_name, role, api_token, created_at";

#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub login: String,
    pub email: String,
    pub display_name: String,
    pub role: String,
    pub api_token: String,
    pub created_at: String,
}

impl User {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: UserId::from(row.get::<_, i64>(0)?),
            login: row.get(1)?,
            email: row.get(2)?,
            display_name: row.get(3)?,
            role: row.get(4)?,
            api_token: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

// ---------------------------------------------------------------------------
// Media
// ---------------------------------------------------------------------------

pub const MEDIA_COLUMNS: &str = "id, owner_id, file_path, url, mime_type, created_at";

/// An asset in the managed media library.
#[derive(Debug, Clone)]
pub struct Media {
    pub id: MediaId,
    pub owner_id: Option<UserId>,
    /// Absolute path of the original file on disk.
    pub file_path: String,
    pub url: String,
    pub mime_type: String,
    pub created_at: String,
}

impl Media {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: MediaId::from(row.get::<_, i64>(0)?),
            owner_id: row.get::<_, Option<i64>>(1)?.map(UserId::from),
            file_path: row.get(2)?,
            url: row.get(3)?,
            mime_type: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

// ---------------------------------------------------------------------------
// AvatarRow
// ---------------------------------------------------------------------------

pub const AVATAR_COLUMNS: &str = "user_id, source_ref, media_id, sizes, updated_at";

/// Persisted avatar record. `sizes` holds generated variants keyed by edge
/// length; the full-size image is `source_ref`.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarRow {
    pub user_id: UserId,
    pub source_ref: String,
    pub media_id: Option<MediaId>,
    pub sizes: BTreeMap<u32, String>,
    pub updated_at: String,
}

impl AvatarRow {
    pub fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        let sizes_json: String = row.get(3)?;
        let sizes = parse_sizes(&sizes_json).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(3, rusqlite::types::Type::Text, Box::new(e))
        })?;
        Ok(Self {
            user_id: UserId::from(row.get::<_, i64>(0)?),
            source_ref: row.get(1)?,
            media_id: row.get::<_, Option<i64>>(2)?.map(MediaId::from),
            sizes,
            updated_at: row.get(4)?,
        })
    }
}

/// Decode the `sizes` column. JSON object keys are strings, so sizes are
/// stored as `{"96": "/uploads/a-96x96.jpg"}`.
pub(crate) fn parse_sizes(json: &str) -> serde_json::Result<BTreeMap<u32, String>> {
    let raw: BTreeMap<String, String> = serde_json::from_str(json)?;
    Ok(raw
        .into_iter()
        .filter_map(|(k, v)| k.parse::<u32>().ok().map(|k| (k, v)))
        .collect())
}

pub(crate) fn encode_sizes(sizes: &BTreeMap<u32, String>) -> String {
    let raw: BTreeMap<String, &String> = sizes.iter().map(|(k, v)| (k.to_string(), v)).collect();
    serde_json::to_string(&raw).unwrap_or_else(|_| "{}".into())
}
