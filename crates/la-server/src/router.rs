//! Axum router construction.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;
use crate::middleware::request_id::request_id_middleware;
use crate::routes;

/// Multipart framing overhead allowed on top of the file size limit.
const MULTIPART_SLACK: usize = 64 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        routes::health::health_check,
        routes::avatars::render_avatar,
        routes::avatars::get_avatar_state,
        routes::avatars::upload_avatar,
        routes::avatars::assign_media,
        routes::avatars::delete_avatar,
        routes::avatars::set_rating,
        routes::users::me,
        routes::users::delete_user,
        routes::media::upload_media,
        routes::media::delete_media,
        routes::settings::get_settings,
        routes::settings::put_settings,
    ),
    components(schemas(
        routes::health::HealthResponse,
        routes::avatars::AvatarResponse,
        routes::avatars::AvatarStateResponse,
        routes::avatars::AssignMediaRequest,
        routes::avatars::SetRatingRequest,
        routes::avatars::RatingResponse,
        routes::users::UserResponse,
        routes::media::MediaResponse,
        la_core::config::AvatarSettings,
        la_core::Rating,
    ))
)]
struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Path component of the uploads URL prefix, without a trailing slash.
/// Empty when uploads live at the site root.
fn uploads_mount(base_url: &str) -> String {
    let path = match base_url.split_once("://") {
        Some((_, rest)) => rest.find('/').map(|i| &rest[i..]).unwrap_or(""),
        None => base_url,
    };
    path.trim_end_matches('/').to_string()
}

/// Build the complete Axum router.
pub fn build_router(ctx: AppContext) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = usize::try_from(ctx.config.uploads.max_upload_bytes)
        .unwrap_or(usize::MAX)
        .saturating_add(MULTIPART_SLACK);

    let protected_routes = Router::new()
        // Users
        .route("/users/me", get(routes::users::me))
        .route("/users/{id}", delete(routes::users::delete_user))
        // Avatars
        .route(
            "/users/{id}/avatar",
            get(routes::avatars::get_avatar_state)
                .post(routes::avatars::upload_avatar)
                .delete(routes::avatars::delete_avatar),
        )
        .route(
            "/users/{id}/avatar/media",
            put(routes::avatars::assign_media),
        )
        .route(
            "/users/{id}/avatar/rating",
            put(routes::avatars::set_rating),
        )
        // Media library
        .route("/media", post(routes::media::upload_media))
        .route("/media/{id}", delete(routes::media::delete_media))
        // Settings
        .route(
            "/settings/avatars",
            get(routes::settings::get_settings).put(routes::settings::put_settings),
        )
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(middleware::from_fn_with_state(ctx.clone(), auth_middleware));

    let uploads = ServeDir::new(&ctx.config.uploads.dir);
    let mount = uploads_mount(&ctx.config.uploads.base_url);

    let app = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/avatar/{id_or_email}", get(routes::avatars::render_avatar))
        .route("/api-docs/openapi.json", get(openapi_json))
        .nest("/api", protected_routes);

    let app = if mount.is_empty() {
        app.fallback_service(uploads)
    } else {
        tracing::debug!(mount = %mount, dir = %ctx.config.uploads.dir.display(), "Serving uploads");
        app.nest_service(&mount, uploads)
    };

    app.layer(middleware::from_fn(request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(ctx)
}
