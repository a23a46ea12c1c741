//! Resolve a user and pixel size to an avatar image tag.

use std::path::PathBuf;

use la_core::config::AvatarSettings;
use la_core::{Error, Result, UserRef};

use crate::directory::Person;
use crate::record::AvatarRecord;
use crate::store::AvatarStore;
use crate::tag::ImageTag;

#[derive(Clone)]
pub struct Resolver {
    store: AvatarStore,
}

impl Resolver {
    pub fn new(store: AvatarStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &AvatarStore {
        &self.store
    }

    /// Find the user's local avatar at `size` pixels.
    ///
    /// `Ok(None)` means there is no usable local avatar and the caller
    /// should fall back: no such user, no record, a rating above the site
    /// maximum, or a library asset that has since been deleted (the record
    /// is dropped in that case).
    ///
    /// Missing sizes are generated once and cached on the record. A failed
    /// generation caches the full-size reference in that slot.
    pub fn resolve(
        &self,
        user: &UserRef,
        size: u32,
        alt: Option<&str>,
        settings: &AvatarSettings,
    ) -> Result<Option<ImageTag>> {
        let services = self.store.services();
        let Some(person) = services.directory.find(user)? else {
            return Ok(None);
        };
        self.resolve_person(&person, size, alt, settings)
    }

    pub fn resolve_person(
        &self,
        person: &Person,
        size: u32,
        alt: Option<&str>,
        settings: &AvatarSettings,
    ) -> Result<Option<ImageTag>> {
        let services = self.store.services();
        let Some(mut record) = self.store.record(person.id)? else {
            return Ok(None);
        };

        if let (Some(rating), Some(max)) = (self.store.stored_rating(person.id)?, settings.max_rating)
        {
            if !rating.allowed_under(max) {
                tracing::debug!(user_id = %person.id, %rating, %max, "Avatar rating above site maximum");
                return Ok(None);
            }
        }

        let source_path = match record.media_id {
            Some(media_id) => match services.library.asset(media_id)? {
                Some(asset) => Some(asset.path),
                None => {
                    tracing::warn!(user_id = %person.id, %media_id, "Avatar media is gone; dropping record");
                    self.store.delete(person.id)?;
                    return Ok(None);
                }
            },
            None => services.storage.url_to_path(record.full()),
        };

        let size = effective_size(size, settings);
        let reference = match record.size(size) {
            Some(cached) => cached.to_string(),
            None if !settings.dynamic_resize => record.full().to_string(),
            None => {
                let url = self.generate(&record, source_path, size);
                record.sizes.insert(size, url.clone());
                self.store.save_sizes(person.id, &record.sizes)?;
                url
            }
        };

        let alt = match alt {
            Some(a) if !a.is_empty() => a,
            _ => person.display_name.as_str(),
        };
        Ok(Some(ImageTag::new(
            services.storage.absolute_url(&reference),
            size,
            alt,
        )))
    }

    /// Produce a variant or, on any failure, the full-size reference.
    fn generate(&self, record: &AvatarRecord, source: Option<PathBuf>, size: u32) -> String {
        let services = self.store.services();
        let result = source
            .ok_or_else(|| Error::generation(size, "source is not in upload storage"))
            .and_then(|path| services.editor.resize(&path, size, size, true))
            .and_then(|out| {
                services.storage.path_to_url(&out).ok_or_else(|| {
                    Error::generation(size, format!("{} is outside uploads", out.display()))
                })
            });

        match result {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(size, source = %record.full(), error = %e, "Avatar resize failed; using full size");
                record.full().to_string()
            }
        }
    }
}

/// Zero means "site default"; anything else is capped at the site maximum.
pub fn effective_size(requested: u32, settings: &AvatarSettings) -> u32 {
    if requested == 0 {
        settings.default_size
    } else {
        requested.min(settings.max_size)
    }
}
