//! Application configuration types.
//!
//! The top-level [`Config`] struct is deserialized from JSON and carries all
//! sub-configs for the server, upload storage, and avatar policy. Every section
//! defaults sensibly so a completely empty `{}` file is valid.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::{Error, Rating};

// ---------------------------------------------------------------------------
// Top-level Config
// ---------------------------------------------------------------------------

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub uploads: UploadConfig,
    pub avatars: AvatarSettings,
}

impl Config {
    /// Deserialize a `Config` from a JSON string.
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Validation(format!("config parse error: {e}")))
    }

    /// Load configuration from a file path, falling back to defaults if the
    /// path is `None` or the file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::default();
        };

        match std::fs::read_to_string(path) {
            Ok(contents) => Self::from_json(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse config file {}: {e}", path.display());
                Self::default()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No config file at {}; using defaults", path.display());
                Self::default()
            }
            Err(e) => {
                tracing::warn!("Failed to read config file {}: {e}", path.display());
                Self::default()
            }
        }
    }

    /// Return a list of validation warnings (non-fatal issues).
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.server.port == 0 {
            warnings.push("server.port is 0; a random port will be assigned".into());
        }

        if !self.server.public_url.starts_with("http://")
            && !self.server.public_url.starts_with("https://")
        {
            warnings.push(format!(
                "server.public_url '{}' is not an absolute http(s) URL",
                self.server.public_url
            ));
        }

        if self.uploads.base_url.is_empty() {
            warnings.push("uploads.base_url is empty; uploaded files cannot be addressed".into());
        }

        if self.uploads.max_upload_bytes == 0 {
            warnings.push("uploads.max_upload_bytes is 0; every upload will be rejected".into());
        }

        let a = &self.avatars;
        if a.default_size == 0 || a.default_size > a.max_size {
            warnings.push(format!(
                "avatars.default_size {} is outside 1..={}",
                a.default_size, a.max_size
            ));
        }

        if let DefaultAvatar::Custom(value) = &a.default_avatar {
            if value.chars().any(char::is_whitespace) {
                warnings.push(format!(
                    "avatars.default_avatar '{value}' contains whitespace"
                ));
            }
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Sub-configs
// ---------------------------------------------------------------------------

/// HTTP server settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    /// Absolute base URL of the site. Relative avatar references are
    /// resolved against it.
    pub public_url: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            db_path: PathBuf::from("./data/localavatars.db"),
            public_url: "http://localhost:8080".into(),
        }
    }
}

/// Where uploaded files live on disk and how they are addressed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: PathBuf,
    /// URL prefix mapped onto `dir`. May be site-relative (`/uploads`) or
    /// absolute.
    pub base_url: String,
    pub max_upload_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./data/uploads"),
            base_url: "/uploads".into(),
            max_upload_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Site-wide avatar policy. Editable at runtime by administrators.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(default)]
pub struct AvatarSettings {
    /// Never fall back to remote Gravatar lookups.
    pub local_only: bool,
    /// Only users with file-upload capability may upload local avatars.
    pub restrict_uploads: bool,
    /// Render avatars at all.
    pub show_avatars: bool,
    /// Highest rating shown on this site. `None` disables the rating gate.
    pub max_rating: Option<Rating>,
    /// Image used when no avatar can be resolved.
    #[schema(value_type = String)]
    pub default_avatar: DefaultAvatar,
    /// Generate resized variants on demand.
    pub dynamic_resize: bool,
    pub default_size: u32,
    pub max_size: u32,
}

impl Default for AvatarSettings {
    fn default() -> Self {
        Self {
            local_only: false,
            restrict_uploads: false,
            show_avatars: true,
            max_rating: Some(Rating::G),
            default_avatar: DefaultAvatar::Mystery,
            dynamic_resize: true,
            default_size: 96,
            max_size: 512,
        }
    }
}

/// Default image choice when a user has no usable avatar.
///
/// Serialized as a plain string: `mystery`, `blank`, `gravatar_default`, or
/// any other value, which is handed to Gravatar as its `d=` parameter (a
/// keyword such as `identicon`, or an image URL).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum DefaultAvatar {
    #[default]
    Mystery,
    Blank,
    GravatarDefault,
    Custom(String),
}

impl From<String> for DefaultAvatar {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" | "mystery" => Self::Mystery,
            "blank" => Self::Blank,
            "gravatar_default" => Self::GravatarDefault,
            _ => Self::Custom(s),
        }
    }
}

impl From<DefaultAvatar> for String {
    fn from(d: DefaultAvatar) -> Self {
        match d {
            DefaultAvatar::Mystery => "mystery".into(),
            DefaultAvatar::Blank => "blank".into(),
            DefaultAvatar::GravatarDefault => "gravatar_default".into(),
            DefaultAvatar::Custom(url) => url,
        }
    }
}
