//! Avatar query and mutation routes.

use std::collections::BTreeMap;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use la_avatar::fallback::{render, RenderRequest};
use la_avatar::permissions::{authorize, Mutation};
use la_avatar::Person;
use la_core::{Error, MediaId, Rating, UserId, UserRef};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::Actor;
use crate::routes::blocking;

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AvatarQuery {
    /// Edge length in pixels. Non-numeric values select the site default.
    pub size: Option<String>,
    /// Default image override (`mystery`, `blank`, `gravatar_default`, or
    /// a Gravatar `d=` value).
    pub default: Option<String>,
    pub alt: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AvatarResponse {
    pub html: String,
    pub url: String,
    pub size: u32,
    pub local: bool,
}

/// Stored avatar state for a user.
#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct AvatarStateResponse {
    pub user_id: UserId,
    pub source: Option<String>,
    pub media_id: Option<MediaId>,
    pub rating: Rating,
    pub sizes: BTreeMap<u32, String>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct AssignMediaRequest {
    pub media_id: MediaId,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct SetRatingRequest {
    /// One of G, PG, R, X. Anything else is stored as G.
    pub rating: Option<String>,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct RatingResponse {
    pub rating: Rating,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn state_of(ctx: &AppContext, user: UserId) -> la_core::Result<AvatarStateResponse> {
    let record = ctx.store.record(user)?;
    let rating = ctx.store.rating(user)?;
    Ok(match record {
        Some(r) => AvatarStateResponse {
            user_id: user,
            source: Some(r.source_ref),
            media_id: r.media_id,
            rating,
            sizes: r.sizes,
        },
        None => AvatarStateResponse {
            user_id: user,
            source: None,
            media_id: None,
            rating,
            sizes: BTreeMap::new(),
        },
    })
}

/// Look up the target and check the actor may perform `mutation` on it.
fn guard(
    ctx: &AppContext,
    actor: &Person,
    target: UserId,
    mutation: Mutation,
) -> la_core::Result<Person> {
    let directory = &ctx.store.services().directory;
    let person = directory
        .find(&UserRef::Id(target))?
        .ok_or_else(|| Error::not_found("user", target))?;
    authorize(directory.as_ref(), actor, mutation, &ctx.settings.get())?;
    Ok(person)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /avatar/{id_or_email}
#[utoipa::path(
    get,
    path = "/avatar/{id_or_email}",
    params(
        ("id_or_email" = String, Path, description = "Numeric user id or email address"),
        AvatarQuery,
    ),
    responses(
        (status = 200, description = "Rendered avatar", body = AvatarResponse),
        (status = 204, description = "Avatars are disabled"),
        (status = 400, description = "Not a user id or email"),
    )
)]
pub async fn render_avatar(
    State(ctx): State<AppContext>,
    Path(id_or_email): Path<String>,
    Query(query): Query<AvatarQuery>,
) -> Result<Response, AppError> {
    let user = UserRef::parse(&id_or_email)
        .ok_or_else(|| Error::validation("expected a numeric user id or an email address"))?;
    let size = query.size.as_deref().and_then(|s| s.trim().parse::<u32>().ok());

    let rendered = blocking(move || {
        let (settings, strategy) = ctx.settings.snapshot();
        let req = RenderRequest {
            user: &user,
            size,
            default: query.default.as_deref(),
            alt: query.alt.as_deref(),
        };
        render(&ctx.resolver, strategy, &settings, &req)
    })
    .await?;

    Ok(match rendered {
        Some(r) => Json(AvatarResponse {
            html: r.html,
            url: r.url,
            size: r.size,
            local: r.local,
        })
        .into_response(),
        None => StatusCode::NO_CONTENT.into_response(),
    })
}

/// GET /api/users/{id}/avatar
#[utoipa::path(
    get,
    path = "/api/users/{id}/avatar",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 200, description = "Stored avatar state", body = AvatarStateResponse),
        (status = 403, description = "Cannot view this user's avatar"),
    )
)]
pub async fn get_avatar_state(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
) -> Result<Json<AvatarStateResponse>, AppError> {
    let state = blocking(move || {
        guard(&ctx, &actor, user_id, Mutation::ViewAvatar(user_id))?;
        state_of(&ctx, user_id)
    })
    .await?;
    Ok(Json(state))
}

/// POST /api/users/{id}/avatar
///
/// Multipart form with an optional `avatar` file and an optional `rating`.
/// A rating alone updates an existing avatar.
#[utoipa::path(
    post,
    path = "/api/users/{id}/avatar",
    params(("id" = i64, Path, description = "User id")),
    responses(
        (status = 201, description = "Avatar uploaded", body = AvatarStateResponse),
        (status = 200, description = "Rating updated", body = AvatarStateResponse),
        (status = 400, description = "Invalid upload"),
        (status = 403, description = "Not allowed"),
    )
)]
pub async fn upload_avatar(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<AvatarStateResponse>), AppError> {
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut rating: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        match field.name() {
            Some("avatar") => {
                let name = field.file_name().unwrap_or_default().to_string();
                let bytes = field.bytes().await?;
                if !name.is_empty() || !bytes.is_empty() {
                    file = Some((name, bytes.to_vec()));
                }
            }
            Some("rating") => rating = Some(field.text().await?),
            _ => {}
        }
    }

    let (status, state) = blocking(move || {
        let target = guard(&ctx, &actor, user_id, Mutation::UploadAvatar(user_id))?;

        let status = match file {
            Some((name, bytes)) => {
                ctx.store.assign_upload(&ctx.upload_policy, &target, &name, &bytes)?;
                StatusCode::CREATED
            }
            None if ctx.store.record(user_id)?.is_some() => StatusCode::OK,
            None => return Err(Error::validation("No avatar file was uploaded.")),
        };
        ctx.store.set_rating(user_id, rating.as_deref())?;
        Ok((status, state_of(&ctx, user_id)?))
    })
    .await?;

    Ok((status, Json(state)))
}

/// PUT /api/users/{id}/avatar/media
#[utoipa::path(
    put,
    path = "/api/users/{id}/avatar/media",
    params(("id" = i64, Path, description = "User id")),
    request_body = AssignMediaRequest,
    responses(
        (status = 200, description = "Library asset assigned", body = AvatarStateResponse),
        (status = 404, description = "Unknown user or media"),
    )
)]
pub async fn assign_media(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<AssignMediaRequest>,
) -> Result<Json<AvatarStateResponse>, AppError> {
    let state = blocking(move || {
        guard(&ctx, &actor, user_id, Mutation::AssignMedia(user_id))?;
        ctx.store.assign_media(user_id, payload.media_id)?;
        state_of(&ctx, user_id)
    })
    .await?;
    Ok(Json(state))
}

/// DELETE /api/users/{id}/avatar
#[utoipa::path(
    delete,
    path = "/api/users/{id}/avatar",
    params(("id" = i64, Path, description = "User id")),
    responses((status = 204, description = "Avatar removed (or there was none)"))
)]
pub async fn delete_avatar(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
) -> Result<StatusCode, AppError> {
    blocking(move || {
        guard(&ctx, &actor, user_id, Mutation::DeleteAvatar(user_id))?;
        ctx.store.delete(user_id)
    })
    .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/users/{id}/avatar/rating
#[utoipa::path(
    put,
    path = "/api/users/{id}/avatar/rating",
    params(("id" = i64, Path, description = "User id")),
    request_body = SetRatingRequest,
    responses((status = 200, description = "Rating stored", body = RatingResponse))
)]
pub async fn set_rating(
    State(ctx): State<AppContext>,
    Extension(Actor(actor)): Extension<Actor>,
    Path(user_id): Path<UserId>,
    Json(payload): Json<SetRatingRequest>,
) -> Result<Json<RatingResponse>, AppError> {
    let rating = blocking(move || {
        guard(&ctx, &actor, user_id, Mutation::SetRating(user_id))?;
        ctx.store.set_rating(user_id, payload.rating.as_deref())
    })
    .await?;
    Ok(Json(RatingResponse { rating }))
}
