//! Managed media library.
//!
//! Library assets outlive any avatar that points at them. The avatar side
//! only ever asks [`AssetLibrary::asset`] for the current location; a
//! missing row or a missing file both read as "deleted".

use std::path::{Path, PathBuf};

use la_core::{Error, MediaId, Result, UserId};
use la_db::pool::{get_conn, DbPool};
use la_db::queries::media;

use crate::storage::UploadStorage;
use crate::upload::{sanitize_file_name, unique_file_name, UploadPolicy};

/// Current location of a library asset.
#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub id: MediaId,
    pub path: PathBuf,
    pub url: String,
    pub mime_type: String,
}

impl Asset {
    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }
}

pub trait AssetLibrary: Send + Sync {
    /// Look up an asset. `None` when it was deleted or its file is gone.
    fn asset(&self, id: MediaId) -> Result<Option<Asset>>;

    /// Validate an uploaded file against `policy`, store it in the upload
    /// directory and register it. The mime type comes from the sniffed
    /// content, never from the client.
    fn import(
        &self,
        storage: &UploadStorage,
        policy: &UploadPolicy,
        owner: Option<UserId>,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Asset>;

    /// Delete an asset and its file. Returns false if it did not exist.
    fn remove(&self, storage: &UploadStorage, id: MediaId) -> Result<bool>;
}

/// [`AssetLibrary`] over the `media` table.
#[derive(Clone)]
pub struct DbAssetLibrary {
    pool: DbPool,
}

impl DbAssetLibrary {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

impl AssetLibrary for DbAssetLibrary {
    fn asset(&self, id: MediaId) -> Result<Option<Asset>> {
        let conn = get_conn(&self.pool)?;
        let Some(row) = media::get_media(&conn, id)? else {
            return Ok(None);
        };
        let path = PathBuf::from(&row.file_path);
        if !path.is_file() {
            tracing::debug!(media_id = %id, path = %path.display(), "Media file missing");
            return Ok(None);
        }
        Ok(Some(Asset {
            id: row.id,
            path,
            url: row.url,
            mime_type: row.mime_type,
        }))
    }

    fn import(
        &self,
        storage: &UploadStorage,
        policy: &UploadPolicy,
        owner: Option<UserId>,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<Asset> {
        let accepted = policy.validate(file_name, bytes)?;
        let stem = Path::new(file_name)
            .file_stem()
            .and_then(|s| s.to_str())
            .map(sanitize_file_name)
            .unwrap_or_else(|| "media".into());

        let name = unique_file_name(storage.dir(), &stem, &accepted.extension);
        let written = storage.write(&name, bytes)?;
        let url = storage
            .path_to_url(&written)
            .ok_or_else(|| Error::Internal(format!("{} is outside uploads", written.display())))?;

        let conn = get_conn(&self.pool)?;
        let row = media::create_media(
            &conn,
            owner,
            &written.to_string_lossy(),
            &url,
            accepted.kind.mime_type(),
        )?;
        tracing::info!(media_id = %row.id, url = %url, "Imported media");

        Ok(Asset {
            id: row.id,
            path: written,
            url,
            mime_type: row.mime_type,
        })
    }

    /// Avatars that referenced the asset are dropped lazily the next time
    /// they are resolved.
    fn remove(&self, storage: &UploadStorage, id: MediaId) -> Result<bool> {
        let conn = get_conn(&self.pool)?;
        let Some(row) = media::get_media(&conn, id)? else {
            return Ok(false);
        };
        storage.remove_if_exists(Path::new(&row.file_path))?;
        media::delete_media(&conn, id)
    }
}
