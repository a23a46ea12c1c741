//! Renderable `<img>` tag.

use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageTag {
    pub url: String,
    pub size: u32,
    pub alt: String,
    /// Marks a configured default image rather than a user's own avatar.
    pub is_default: bool,
}

impl ImageTag {
    pub fn new(url: impl Into<String>, size: u32, alt: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            size,
            alt: alt.into(),
            is_default: false,
        }
    }

    pub fn default_image(url: impl Into<String>, size: u32, alt: impl Into<String>) -> Self {
        Self {
            is_default: true,
            ..Self::new(url, size, alt)
        }
    }

    pub fn class(&self) -> String {
        let mut class = format!("avatar avatar-{} photo", self.size);
        if self.is_default {
            class.push_str(" avatar-default");
        }
        class
    }

    pub fn to_html(&self) -> String {
        format!(
            "<img alt='{}' src='{}' class='{}' height='{size}' width='{size}' />",
            html_escape::encode_single_quoted_attribute(&self.alt),
            html_escape::encode_single_quoted_attribute(&self.url),
            self.class(),
            size = self.size,
        )
    }
}
