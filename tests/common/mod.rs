//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates an in-memory DB, a temporary
//! uploads directory, and a full [`AppContext`]. The [`with_server`]
//! constructor starts Axum on a random port for HTTP-level testing.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;

use la_core::config::Config;
use la_core::UserId;
use la_db::pool::{init_memory_pool, DbPool};
use la_server::context::AppContext;
use la_server::router::build_router;
use tempfile::TempDir;

/// Test harness wrapping a fully-constructed [`AppContext`] backed by an
/// in-memory database and a throwaway uploads directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub uploads: TempDir,
}

impl TestHarness {
    /// Create a harness for `config`, pointing its uploads at a fresh
    /// temporary directory.
    pub fn with_config(mut config: Config) -> Self {
        let uploads = tempfile::tempdir().expect("failed to create uploads dir");
        config.uploads.dir = uploads.path().to_path_buf();
        config.uploads.base_url = "/uploads".into();

        let db = init_memory_pool().expect("failed to create in-memory pool");
        let ctx = AppContext::new(config, None, db.clone());
        Self { ctx, db, uploads }
    }

    /// Start an Axum server on a random port and return the harness together
    /// with the bound socket address.
    pub async fn with_server() -> (Self, SocketAddr) {
        Self::with_server_config(Config::default()).await
    }

    /// Start an Axum server with custom config on a random port. The public
    /// URL is set to the bound address so avatar URLs are fetchable.
    pub async fn with_server_config(mut config: Config) -> (Self, SocketAddr) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");
        config.server.public_url = format!("http://{addr}");

        let harness = Self::with_config(config);
        let app = build_router(harness.ctx.clone());

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        (harness, addr)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> la_db::pool::PooledConnection {
        la_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Create a user and return its id and API token. The display name is
    /// the login; the email is `{login}@example.test`.
    pub fn create_user(&self, login: &str, role: &str) -> (UserId, String) {
        let user = la_db::queries::users::create_user(
            &self.conn(),
            login,
            &format!("{login}@example.test"),
            login,
            role,
        )
        .expect("failed to create user");
        (user.id, user.api_token)
    }
}

/// A solid-colour PNG of the given dimensions.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([200, 80, 40]));
    let mut buf = Cursor::new(Vec::new());
    img.write_to(&mut buf, image::ImageFormat::Png)
        .expect("failed to encode png");
    buf.into_inner()
}

/// Multipart form carrying `bytes` as the `field` file part.
pub fn file_form(field: &'static str, file_name: &str, mime: &str, bytes: Vec<u8>) -> reqwest::multipart::Form {
    let part = reqwest::multipart::Part::bytes(bytes)
        .file_name(file_name.to_string())
        .mime_str(mime)
        .expect("valid mime type");
    reqwest::multipart::Form::new().part(field, part)
}
