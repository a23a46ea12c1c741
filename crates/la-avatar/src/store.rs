//! Avatar record lifecycle: assign, replace, delete, rate.

use std::collections::{BTreeMap, HashSet};

use la_core::{Error, MediaId, Rating, Result, UserId};
use la_db::pool::get_conn;
use la_db::queries::{avatars, ratings};

use crate::directory::Person;
use crate::record::AvatarRecord;
use crate::upload::{store_upload, UploadPolicy};
use crate::AvatarServices;

#[derive(Clone)]
pub struct AvatarStore {
    services: AvatarServices,
}

impl AvatarStore {
    pub fn new(services: AvatarServices) -> Self {
        Self { services }
    }

    pub fn services(&self) -> &AvatarServices {
        &self.services
    }

    pub fn record(&self, user: UserId) -> Result<Option<AvatarRecord>> {
        let conn = get_conn(&self.services.pool)?;
        Ok(avatars::get_avatar(&conn, user)?.map(AvatarRecord::from))
    }

    /// Replace whatever the user had with a fresh record pointing at
    /// `source_ref`. The previous record's files and rating are removed
    /// first.
    pub fn assign(
        &self,
        user: UserId,
        source_ref: &str,
        media_id: Option<MediaId>,
    ) -> Result<AvatarRecord> {
        self.delete(user)?;

        let record = AvatarRecord::new(source_ref, media_id);
        let conn = get_conn(&self.services.pool)?;
        avatars::upsert_avatar(&conn, user, &record.source_ref, media_id, &record.sizes)?;

        tracing::info!(user_id = %user, source = %source_ref, media_id = ?media_id, "Assigned avatar");
        Ok(record)
    }

    /// Validate an uploaded file, store it under a name derived from the
    /// target's display name, and assign it.
    pub fn assign_upload(
        &self,
        policy: &UploadPolicy,
        target: &Person,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<AvatarRecord> {
        let accepted = policy.validate(file_name, bytes)?;
        let url = store_upload(&self.services.storage, &accepted, &target.display_name, bytes)?;
        self.assign(target.id, &url, None)
    }

    /// Assign an existing library asset. Only images qualify.
    pub fn assign_media(&self, user: UserId, media_id: MediaId) -> Result<AvatarRecord> {
        let asset = self
            .services
            .library
            .asset(media_id)?
            .ok_or_else(|| Error::not_found("media", media_id))?;
        if !asset.is_image() {
            return Err(Error::validation(crate::upload::INVALID_IMAGE));
        }
        self.assign(user, &asset.url, Some(media_id))
    }

    /// Remove the user's avatar, its owned files, and its rating. Returns
    /// false when there was nothing to delete.
    ///
    /// Variants of a library asset are shared by every user pointing at it,
    /// so a variant another record still caches is left in place.
    pub fn delete(&self, user: UserId) -> Result<bool> {
        let conn = get_conn(&self.services.pool)?;
        let Some(record) = avatars::get_avatar(&conn, user)?.map(AvatarRecord::from) else {
            return Ok(false);
        };

        let mut shared = HashSet::new();
        if let Some(media_id) = record.media_id {
            for other in avatars::users_with_media(&conn, media_id)? {
                if other == user {
                    continue;
                }
                if let Some(row) = avatars::get_avatar(&conn, other)? {
                    shared.extend(AvatarRecord::from(row).sizes.into_values());
                }
            }
        }

        let storage = &self.services.storage;
        for url in record.owned_files() {
            if shared.contains(url) {
                tracing::debug!(user_id = %user, url, "Variant still in use; kept");
                continue;
            }
            match storage.url_to_path(url) {
                Some(path) => {
                    if storage.remove_if_exists(&path)? {
                        tracing::debug!(user_id = %user, path = %path.display(), "Removed avatar file");
                    }
                }
                None => tracing::debug!(user_id = %user, url, "Avatar file outside uploads; skipped"),
            }
        }

        avatars::delete_avatar(&conn, user)?;
        ratings::delete_rating(&conn, user)?;
        tracing::info!(user_id = %user, "Deleted avatar");
        Ok(true)
    }

    /// Persist the rating. Missing or unknown values become G.
    pub fn set_rating(&self, user: UserId, value: Option<&str>) -> Result<Rating> {
        let rating = Rating::parse_or_default(value);
        let conn = get_conn(&self.services.pool)?;
        ratings::set_rating(&conn, user, rating)?;
        Ok(rating)
    }

    /// The stored rating, if any.
    pub fn stored_rating(&self, user: UserId) -> Result<Option<Rating>> {
        let conn = get_conn(&self.services.pool)?;
        ratings::get_rating(&conn, user)
    }

    /// Effective rating, G when none is stored.
    pub fn rating(&self, user: UserId) -> Result<Rating> {
        Ok(self.stored_rating(user)?.unwrap_or_default())
    }

    pub(crate) fn save_sizes(&self, user: UserId, sizes: &BTreeMap<u32, String>) -> Result<()> {
        let conn = get_conn(&self.services.pool)?;
        avatars::update_sizes(&conn, user, sizes)?;
        Ok(())
    }

    /// Delete every avatar and rating. Returns how many avatars went.
    pub fn sweep(&self) -> Result<usize> {
        let users: Vec<UserId> = {
            let conn = get_conn(&self.services.pool)?;
            avatars::list_avatars(&conn)?
                .into_iter()
                .map(|row| row.user_id)
                .collect()
        };

        let mut removed = 0;
        for user in users {
            if self.delete(user)? {
                removed += 1;
            }
        }

        let conn = get_conn(&self.services.pool)?;
        ratings::delete_all_ratings(&conn)?;
        tracing::info!(removed, "Swept avatars");
        Ok(removed)
    }
}
