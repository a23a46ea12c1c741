//! Route handlers for the HTTP API.

pub mod avatars;
pub mod health;
pub mod media;
pub mod settings;
pub mod users;

use crate::error::AppError;

/// Run synchronous store/resolver work off the async runtime.
pub(crate) async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> la_core::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| la_core::Error::Internal(format!("spawn_blocking join error: {e}")))?
        .map_err(AppError::from)
}
