//! What to render when a user has no usable local avatar.
//!
//! The strategy is picked once from settings when they are loaded or
//! changed. `Supplement` hands off to Gravatar for the user's email;
//! `LocalOnly` never asks Gravatar about a user and shows the configured
//! default image instead.

use la_core::config::{AvatarSettings, DefaultAvatar};
use la_core::{Result, UserRef};
use serde::Serialize;
use sha2::{Digest, Sha256};

use crate::resolver::{effective_size, Resolver};
use crate::tag::ImageTag;

const GRAVATAR_HOST: &str = "https://secure.gravatar.com";
/// Gravatar's own "mystery person" image.
const MYSTERY_HASH: &str = "ad516503a11cd5ca435acc9bb6523536";
/// 1x1 transparent GIF.
const BLANK_GIF: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    Supplement,
    LocalOnly,
}

impl FallbackStrategy {
    pub fn from_settings(settings: &AvatarSettings) -> Self {
        if settings.local_only {
            Self::LocalOnly
        } else {
            Self::Supplement
        }
    }
}

/// One avatar query.
#[derive(Debug, Clone)]
pub struct RenderRequest<'a> {
    pub user: &'a UserRef,
    /// `None` or 0 selects the site default size.
    pub size: Option<u32>,
    /// Overrides the configured default image for this request.
    pub default: Option<&'a str>,
    pub alt: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedAvatar {
    pub html: String,
    pub url: String,
    pub size: u32,
    /// True when the image is the user's own local avatar.
    pub local: bool,
}

impl From<ImageTag> for RenderedAvatar {
    fn from(tag: ImageTag) -> Self {
        Self {
            html: tag.to_html(),
            local: !tag.is_default && !tag.url.starts_with(GRAVATAR_HOST),
            size: tag.size,
            url: tag.url,
        }
    }
}

/// Render the avatar for a request. `Ok(None)` when avatars are disabled.
pub fn render(
    resolver: &Resolver,
    strategy: FallbackStrategy,
    settings: &AvatarSettings,
    req: &RenderRequest<'_>,
) -> Result<Option<RenderedAvatar>> {
    if !settings.show_avatars {
        return Ok(None);
    }

    let size = effective_size(req.size.unwrap_or(0), settings);
    let directory = &resolver.store().services().directory;
    let person = directory.find(req.user)?;

    if let Some(person) = &person {
        if let Some(tag) = resolver.resolve_person(person, size, req.alt, settings)? {
            return Ok(Some(tag.into()));
        }
    }

    let default = req
        .default
        .filter(|d| !d.is_empty())
        .map(|d| DefaultAvatar::from(d.to_string()))
        .unwrap_or_else(|| settings.default_avatar.clone());
    let alt = req.alt.unwrap_or("");

    let email = match (&person, req.user) {
        (Some(p), _) => Some(p.email.as_str()),
        (None, UserRef::Email(e)) => Some(e.as_str()),
        (None, UserRef::Id(_)) => None,
    };

    let tag = match (strategy, email) {
        (FallbackStrategy::Supplement, Some(email)) => ImageTag::new(
            gravatar_url(email, size, &default, settings.max_rating),
            size,
            alt,
        ),
        _ => ImageTag::default_image(default_image_url(&default, size), size, alt),
    };
    Ok(Some(tag.into()))
}

/// Remote Gravatar URL for an email address.
pub fn gravatar_url(
    email: &str,
    size: u32,
    default: &DefaultAvatar,
    max_rating: Option<la_core::Rating>,
) -> String {
    let hash = hex::encode(Sha256::digest(email.trim().to_lowercase().as_bytes()));
    let mut url = format!("{GRAVATAR_HOST}/avatar/{hash}?s={size}");
    match default {
        DefaultAvatar::Mystery => url.push_str("&d=mm"),
        DefaultAvatar::Blank => url.push_str("&d=blank"),
        DefaultAvatar::GravatarDefault => {}
        DefaultAvatar::Custom(d) => {
            url.push_str("&d=");
            url.push_str(&urlencoding::encode(d));
        }
    }
    if let Some(r) = max_rating {
        url.push_str("&r=");
        url.push_str(&r.as_str().to_ascii_lowercase());
    }
    url
}

/// Image shown in place of any user's avatar.
pub fn default_image_url(default: &DefaultAvatar, size: u32) -> String {
    match default {
        DefaultAvatar::Mystery => format!("{GRAVATAR_HOST}/avatar/{MYSTERY_HASH}?s={size}"),
        DefaultAvatar::Blank => BLANK_GIF.to_string(),
        DefaultAvatar::GravatarDefault => format!("{GRAVATAR_HOST}/avatar/?s={size}"),
        DefaultAvatar::Custom(d) => {
            format!("{GRAVATAR_HOST}/avatar/?d={}&s={size}", urlencoding::encode(d))
        }
    }
}
