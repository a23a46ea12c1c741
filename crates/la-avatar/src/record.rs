//! The per-user avatar record.

use std::collections::BTreeMap;

use la_core::MediaId;
use la_db::models::AvatarRow;

/// Source image plus any generated size variants.
///
/// The full-size entry is always `source_ref`; `sizes` only carries
/// pixel-keyed variants, filled lazily.
#[derive(Debug, Clone, PartialEq)]
pub struct AvatarRecord {
    pub source_ref: String,
    pub media_id: Option<MediaId>,
    pub sizes: BTreeMap<u32, String>,
}

impl AvatarRecord {
    pub fn new(source_ref: impl Into<String>, media_id: Option<MediaId>) -> Self {
        Self {
            source_ref: source_ref.into(),
            media_id,
            sizes: BTreeMap::new(),
        }
    }

    pub fn full(&self) -> &str {
        &self.source_ref
    }

    /// Cached reference for a pixel size, if one has been produced.
    pub fn size(&self, px: u32) -> Option<&str> {
        self.sizes.get(&px).map(String::as_str)
    }

    /// References whose files belong to this avatar and should be unlinked
    /// when it goes away. A managed-library asset is owned elsewhere, so its
    /// full-size file (and any slot that fell back to it) is left alone.
    pub fn owned_files(&self) -> Vec<&str> {
        let mut refs: Vec<&str> = Vec::with_capacity(self.sizes.len() + 1);
        if self.media_id.is_none() {
            refs.push(&self.source_ref);
        }
        for url in self.sizes.values() {
            if self.media_id.is_some() && url == &self.source_ref {
                continue;
            }
            if !refs.contains(&url.as_str()) {
                refs.push(url);
            }
        }
        refs
    }
}

impl From<AvatarRow> for AvatarRecord {
    fn from(row: AvatarRow) -> Self {
        Self {
            source_ref: row.source_ref,
            media_id: row.media_id,
            sizes: row.sizes,
        }
    }
}
