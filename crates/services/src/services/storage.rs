use std::path::{Path, PathBuf};

use chrono::Utc;
use thiserror::Error;

/// Substituted when sanitizing leaves nothing usable of an original name.
pub const FALLBACK_ATTACHMENT_NAME: &str = "attachment";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Flat on-disk store for gallery images. Database rows reference files by
/// bare name only; this service owns the mapping to real paths.
#[derive(Debug, Clone)]
pub struct ImageStorage {
    root: PathBuf,
}

impl ImageStorage {
    pub fn new(root: PathBuf) -> Result<ImageStorage> {
        std::fs::create_dir_all(&root)?;
        Ok(ImageStorage { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_of(&self, file_name: &str) -> PathBuf {
        self.root.join(file_name)
    }

    /// `<UTC timestamp>_<8 hex digits>_<sanitized original>`. The timestamp
    /// keeps listings roughly chronological, the random suffix keeps two
    /// attachments arriving in the same second apart.
    pub fn unique_name(&self, original: &str) -> String {
        let timestamp = Utc::now().format("%Y%m%d%H%M%S");
        let suffix = rand::random::<u32>();
        format!("{}_{:08x}_{}", timestamp, suffix, sanitize_file_name(original))
    }

    pub fn write(&self, file_name: &str, bytes: &[u8]) -> Result<()> {
        std::fs::write(self.path_of(file_name), bytes)?;
        Ok(())
    }

    /// Best-effort removal. A file that is already gone is fine; anything
    /// else is logged and swallowed so row cleanup can still proceed.
    pub fn remove(&self, file_name: &str) {
        let path = self.path_of(file_name);
        if let Err(err) = std::fs::remove_file(&path) {
            if err.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!("Failed to remove {}: {}", path.display(), err);
            }
        }
    }
}

/// Reduces an attacker-controlled attachment name to something safe to join
/// onto the upload root: path separators and anything outside
/// `[A-Za-z0-9._-]` become underscores, then leading dots and underscores are
/// dropped so the result can never be a dotfile or traversal fragment.
pub fn sanitize_file_name(name: &str) -> String {
    let mapped: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = mapped.trim_start_matches(['.', '_']);
    if trimmed.is_empty() {
        FALLBACK_ATTACHMENT_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}
