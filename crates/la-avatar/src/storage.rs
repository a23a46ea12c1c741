//! Upload directory and the mapping between public URLs and on-disk paths.

use std::path::{Component, Path, PathBuf};

use la_core::Result;

/// Files under `dir` are served at `base_url`. `public_url` is the site's
/// absolute origin, used to make relative references absolute.
#[derive(Debug, Clone)]
pub struct UploadStorage {
    dir: PathBuf,
    base_url: String,
    public_url: String,
}

impl UploadStorage {
    pub fn new(dir: impl Into<PathBuf>, base_url: &str, public_url: &str) -> Self {
        Self {
            dir: dir.into(),
            base_url: base_url.trim_end_matches('/').to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Map a stored reference (absolute or site-relative) onto a file under
    /// the upload directory. Returns `None` for references outside it.
    pub fn url_to_path(&self, url: &str) -> Option<PathBuf> {
        let site_relative = url.strip_prefix(&self.public_url).unwrap_or(url);
        let rest = url
            .strip_prefix(&self.base_url)
            .or_else(|| site_relative.strip_prefix(&self.base_url))?;
        let rest = rest.strip_prefix('/')?;

        let rel = Path::new(rest);
        if rel
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return None;
        }
        Some(self.dir.join(rel))
    }

    /// Inverse of [`url_to_path`](Self::url_to_path).
    pub fn path_to_url(&self, path: &Path) -> Option<String> {
        let rel = path.strip_prefix(&self.dir).ok()?;
        let parts: Vec<&str> = rel
            .components()
            .map(|c| match c {
                Component::Normal(s) => s.to_str(),
                _ => None,
            })
            .collect::<Option<_>>()?;
        if parts.is_empty() {
            return None;
        }
        Some(format!("{}/{}", self.base_url, parts.join("/")))
    }

    /// Resolve a reference against the public base URL unless it is already
    /// absolute.
    pub fn absolute_url(&self, reference: &str) -> String {
        if reference.starts_with("http") {
            reference.to_string()
        } else if reference.starts_with('/') {
            format!("{}{reference}", self.public_url)
        } else {
            format!("{}/{reference}", self.public_url)
        }
    }

    /// Write bytes to `file_name` inside the upload directory and return
    /// the written path.
    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.dir.join(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }

    /// Unlink a file. A missing file is not an error; returns whether
    /// anything was removed.
    pub fn remove_if_exists(&self, path: &Path) -> Result<bool> {
        match std::fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
