//! Media library routes.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use la_avatar::permissions::{authorize, Mutation};
use la_core::{Error, MediaId, UserId};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::Actor;
use crate::routes::blocking;

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct MediaResponse {
    pub id: MediaId,
    pub owner_id: Option<UserId>,
    pub url: String,
    pub mime_type: String,
}

/// POST /api/media
///
/// Multipart form with a single `file` field. Only JPEG, GIF and PNG images
/// are accepted; the stored mime type is taken from the file content.
#[utoipa::path(
    post,
    path = "/api/media",
    responses(
        (status = 201, description = "File added to the library", body = MediaResponse),
        (status = 400, description = "Missing file or not an accepted image"),
        (status = 403, description = "Upload capability required"),
    )
)]
pub async fn upload_media(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<MediaResponse>), AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or_default().to_string();
            let bytes = field.bytes().await?;
            file = Some((name, bytes.to_vec()));
        }
    }

    let (name, bytes) = file.ok_or_else(|| Error::validation("missing `file` field"))?;

    let owner = actor.id;
    let asset = blocking(move || {
        authorize(
            ctx.store.services().directory.as_ref(),
            &actor,
            Mutation::UploadMedia,
            &ctx.settings.get(),
        )?;
        if name.trim().is_empty() {
            return Err(Error::validation("file name is required"));
        }
        ctx.library()
            .import(ctx.storage(), &ctx.upload_policy, Some(owner), &name, &bytes)
    })
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(MediaResponse {
            id: asset.id,
            owner_id: Some(owner),
            url: asset.url,
            mime_type: asset.mime_type,
        }),
    ))
}

/// DELETE /api/media/{id}
///
/// Avatars that used the asset are cleared the next time they resolve.
#[utoipa::path(
    delete,
    path = "/api/media/{id}",
    params(("id" = i64, Path, description = "Media id")),
    responses(
        (status = 204, description = "Media deleted"),
        (status = 403, description = "Not the owner"),
        (status = 404, description = "Unknown media"),
    )
)]
pub async fn delete_media(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(media_id): Path<MediaId>,
) -> Result<StatusCode, AppError> {
    blocking(move || {
        let conn = la_db::pool::get_conn(&ctx.db)?;
        let row = la_db::queries::media::get_media(&conn, media_id)?
            .ok_or_else(|| Error::not_found("media", media_id))?;
        drop(conn);

        authorize(
            ctx.store.services().directory.as_ref(),
            &actor,
            Mutation::DeleteMedia { owner: row.owner_id },
            &ctx.settings.get(),
        )?;
        ctx.library().remove(ctx.storage(), media_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}
