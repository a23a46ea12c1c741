//! Shared fixtures for unit tests.

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use la_core::{Error, Result, UserId};
use la_db::pool::{init_memory_pool, DbPool};
use la_db::queries::{media, users};
use tempfile::TempDir;

use crate::directory::{person_from_user, Person};
use crate::editor::{variant_path, ImageEditor};
use crate::library::Asset;
use crate::{AvatarServices, AvatarStore, Resolver, UploadStorage};

/// Editor that records calls and touches the variant file instead of
/// decoding anything.
#[derive(Clone, Default)]
pub struct CountingEditor {
    calls: Arc<AtomicUsize>,
    last_source: Arc<Mutex<Option<PathBuf>>>,
    fail: bool,
}

impl CountingEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_source(&self) -> Option<PathBuf> {
        self.last_source.lock().unwrap().clone()
    }
}

impl ImageEditor for CountingEditor {
    fn resize(&self, source: &Path, width: u32, height: u32, _crop: bool) -> Result<PathBuf> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_source.lock().unwrap() = Some(source.to_path_buf());
        if self.fail {
            return Err(Error::generation(width, "editor unavailable"));
        }
        let dest = variant_path(source, width, height).unwrap();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&dest, b"variant").unwrap();
        Ok(dest)
    }
}

pub struct Fixture {
    pub dir: TempDir,
    pub pool: DbPool,
    pub store: AvatarStore,
    pub resolver: Resolver,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_editor(CountingEditor::new())
    }

    pub fn with_editor(editor: impl ImageEditor + 'static) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = init_memory_pool().unwrap();
        let storage = UploadStorage::new(dir.path(), "/up", "http://localhost");
        let mut services = AvatarServices::with_defaults(pool.clone(), storage);
        services.editor = Arc::new(editor);

        let store = AvatarStore::new(services);
        Self {
            resolver: Resolver::new(store.clone()),
            store,
            pool,
            dir,
        }
    }

    pub fn storage(&self) -> &UploadStorage {
        &self.store.services().storage
    }

    /// Create a user whose display name is the capitalized login and whose
    /// email is `{login}@test.local`.
    pub fn user(&self, login: &str, role: &str) -> Person {
        let conn = self.pool.get().unwrap();
        let u = users::create_user(
            &conn,
            login,
            &format!("{login}@test.local"),
            &capitalize(login),
            role,
        )
        .unwrap();
        person_from_user(u)
    }

    pub fn user_with_id(&self, id: i64, login: &str, role: &str) -> Person {
        let conn = self.pool.get().unwrap();
        conn.execute(
            "INSERT INTO users (id, login, email, display_name, role, api_token, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'now')",
            insert_values(id, login, role),
        )
        .unwrap();
        let u = users::get_user_by_id(&conn, UserId::from(id)).unwrap().unwrap();
        person_from_user(u)
    }

    /// Write a placeholder file in the upload directory.
    pub fn file(&self, name: &str) -> PathBuf {
        let path = self.dir.path().join(name);
        std::fs::write(&path, b"file").unwrap();
        path
    }

    pub fn media(&self, name: &str) -> Asset {
        let mime = if name.ends_with(".png") { "image/png" } else { "image/jpeg" };
        self.media_with_mime(name, mime)
    }

    /// Register a placeholder file as a library asset without any content
    /// checks.
    pub fn media_with_mime(&self, name: &str, mime: &str) -> Asset {
        let path = self.file(name);
        let url = self.storage().path_to_url(&path).unwrap();
        let conn = self.pool.get().unwrap();
        let row = media::create_media(&conn, None, &path.to_string_lossy(), &url, mime).unwrap();
        Asset {
            id: row.id,
            path,
            url,
            mime_type: row.mime_type,
        }
    }

    pub fn png_bytes(&self, w: u32, h: u32) -> Vec<u8> {
        let img = image::RgbImage::from_pixel(w, h, image::Rgb([10, 120, 200]));
        let mut buf = Cursor::new(Vec::new());
        image::DynamicImage::ImageRgb8(img)
            .write_to(&mut buf, image::ImageFormat::Png)
            .unwrap();
        buf.into_inner()
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn insert_values(id: i64, login: &str, role: &str) -> [String; 6] {
    [
        id.to_string(),
        login.to_string(),
        format!("{login}@test.local"),
        capitalize(login),
        role.to_string(),
        la_db::queries::users::generate_token(),
    ]
}
