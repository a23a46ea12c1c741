//! Site avatar settings.

use axum::extract::State;
use axum::{Extension, Json};
use la_avatar::permissions::{authorize, Mutation};
use la_core::config::AvatarSettings;
use la_core::Error;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::Actor;
use crate::routes::blocking;

/// GET /api/settings/avatars
#[utoipa::path(
    get,
    path = "/api/settings/avatars",
    responses((status = 200, description = "Current avatar settings", body = AvatarSettings))
)]
pub async fn get_settings(State(ctx): State<AppContext>) -> Json<AvatarSettings> {
    Json(ctx.settings.get())
}

/// PUT /api/settings/avatars
#[utoipa::path(
    put,
    path = "/api/settings/avatars",
    request_body = AvatarSettings,
    responses(
        (status = 200, description = "Settings replaced", body = AvatarSettings),
        (status = 400, description = "Invalid settings"),
        (status = 403, description = "Administrators only"),
    )
)]
pub async fn put_settings(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Json(settings): Json<AvatarSettings>,
) -> Result<Json<AvatarSettings>, AppError> {
    let updated = blocking(move || {
        authorize(
            ctx.store.services().directory.as_ref(),
            &actor,
            Mutation::UpdateSettings,
            &ctx.settings.get(),
        )?;
        if settings.default_size == 0 || settings.max_size == 0 {
            return Err(Error::validation("sizes must be greater than zero"));
        }
        if settings.default_size > settings.max_size {
            return Err(Error::validation("default_size must not exceed max_size"));
        }

        let strategy = ctx.settings.set(settings);
        tracing::info!(?strategy, by = %actor.id, "Avatar settings updated");
        ctx.settings.persist();
        Ok(ctx.settings.get())
    })
    .await?;
    Ok(Json(updated))
}
