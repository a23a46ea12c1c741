//! Bearer-token authentication.
//!
//! Protected routes require `Authorization: Bearer <api_token>`. The token
//! is looked up in the `users` table and the resolved [`Actor`] is inserted
//! into request extensions for handlers.

use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use la_avatar::directory::person_from_user;
use la_avatar::Person;
use la_db::pool::DbPool;

use crate::context::AppContext;
use crate::error::AppError;

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Actor(pub Person);

/// Resolve a raw `Authorization` header value to the user it belongs to.
pub fn authenticate(db: &DbPool, authorization: Option<&str>) -> la_core::Result<Person> {
    let token = authorization
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| la_core::Error::Unauthorized("missing bearer token".into()))?;

    let conn = la_db::pool::get_conn(db)?;
    la_db::queries::users::get_user_by_token(&conn, token)?
        .map(person_from_user)
        .ok_or_else(|| la_core::Error::Unauthorized("invalid token".into()))
}

pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let authorization = request
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_owned());

    let db = ctx.db.clone();
    let person = tokio::task::spawn_blocking(move || authenticate(&db, authorization.as_deref()))
        .await
        .map_err(|e| {
            AppError::new(la_core::Error::Internal(format!("auth task failed: {e}"))).into_response()
        })?
        .map_err(|e| AppError::new(e).into_response())?;

    tracing::debug!(user_id = %person.id, role = %person.role, "Authenticated");
    request.extensions_mut().insert(Actor(person));
    Ok(next.run(request).await)
}
