//! Account routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use la_avatar::permissions::{authorize, Mutation};
use la_core::{Error, UserId};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::Actor;
use crate::routes::blocking;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct UserResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: String,
}

/// GET /api/users/me
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The authenticated user", body = UserResponse),
        (status = 401, description = "Missing or invalid token"),
    )
)]
pub async fn me(Extension(Actor(actor)): Extension<Actor>) -> Json<UserResponse> {
    Json(UserResponse {
        id: actor.id,
        email: actor.email,
        display_name: actor.display_name,
        role: actor.role.to_string(),
    })
}

/// DELETE /api/users/{id}
///
/// Removes the account together with its avatar files and rating.
#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 204, description = "Account deleted"),
        (status = 403, description = "Administrators only"),
        (status = 404, description = "Unknown user"),
    )
)]
pub async fn delete_user(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    blocking(move || {
        let directory = &ctx.store.services().directory;
        authorize(
            directory.as_ref(),
            &actor,
            Mutation::DeleteAccount(user_id),
            &ctx.settings.get(),
        )?;

        let conn = la_db::pool::get_conn(&ctx.db)?;
        if la_db::queries::users::get_user_by_id(&conn, user_id)?.is_none() {
            return Err(Error::not_found("user", user_id));
        }
        drop(conn);

        ctx.store.delete(user_id)?;
        let conn = la_db::pool::get_conn(&ctx.db)?;
        la_db::queries::users::delete_user(&conn, user_id)?;
        tracing::info!(user_id = %user_id, by = %actor.id, "Account deleted");
        Ok(())
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
