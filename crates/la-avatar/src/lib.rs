//! la-avatar: locally hosted avatars.
//!
//! [`Resolver`] turns a user reference and pixel size into an [`ImageTag`],
//! applying the rating gate and generating size variants on first request.
//! [`AvatarStore`] owns the per-user record lifecycle and removes stale files
//! when an avatar is replaced or deleted. Both are built from an explicit
//! [`AvatarServices`] bundle of collaborators.

pub mod directory;
pub mod editor;
pub mod fallback;
pub mod library;
pub mod permissions;
pub mod record;
pub mod resolver;
pub mod storage;
pub mod store;
pub mod tag;
pub mod upload;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use la_db::pool::DbPool;

pub use directory::{DbDirectory, Directory, Person, Role};
pub use editor::{ImageEditor, RasterEditor};
pub use fallback::{FallbackStrategy, RenderRequest, RenderedAvatar};
pub use library::{Asset, AssetLibrary, DbAssetLibrary};
pub use permissions::Mutation;
pub use record::AvatarRecord;
pub use resolver::Resolver;
pub use storage::UploadStorage;
pub use store::AvatarStore;
pub use tag::ImageTag;
pub use upload::UploadPolicy;

/// Collaborators shared by the store and resolver.
#[derive(Clone)]
pub struct AvatarServices {
    pub pool: DbPool,
    pub storage: UploadStorage,
    pub editor: Arc<dyn ImageEditor>,
    pub library: Arc<dyn AssetLibrary>,
    pub directory: Arc<dyn Directory>,
}

impl AvatarServices {
    /// Wire the default SQLite-backed collaborators and the raster editor.
    pub fn with_defaults(pool: DbPool, storage: UploadStorage) -> Self {
        Self {
            library: Arc::new(DbAssetLibrary::new(pool.clone())),
            directory: Arc::new(DbDirectory::new(pool.clone())),
            editor: Arc::new(RasterEditor),
            pool,
            storage,
        }
    }
}
