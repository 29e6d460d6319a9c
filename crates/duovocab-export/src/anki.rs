use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::media::MediaStore;

/// Anki's data folder name under the platform data directory.
pub const ANKI_DIR_NAME: &str = "Anki2";
/// Per-profile media store folder.
pub const MEDIA_DIR_NAME: &str = "collection.media";

/// Default Anki data directory for this platform.
///
/// `~/Library/Application Support/Anki2` on macOS, `%APPDATA%\Anki2` on
/// Windows, `$XDG_DATA_HOME/Anki2` (or `~/.local/share/Anki2`) on Linux.
pub fn default_anki_root() -> Option<PathBuf> {
    dirs::data_dir().map(|d| d.join(ANKI_DIR_NAME))
}

/// Profile folder names under `root`, i.e. subdirectories holding a
/// `collection.media` folder. Sorted for stable prompting.
pub fn find_profiles(root: &Path) -> Result<Vec<String>> {
    let entries =
        fs::read_dir(root).with_context(|| format!("Failed to list {}", root.display()))?;

    let mut profiles = Vec::new();
    for entry in entries {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() && path.join(MEDIA_DIR_NAME).is_dir() {
            profiles.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    profiles.sort();
    tracing::debug!(root = %root.display(), count = profiles.len(), "Found Anki profiles");
    Ok(profiles)
}

/// The per-language media directory of a profile, created if missing.
pub fn ensure_media_dir(root: &Path, profile: &str, language_code: &str) -> Result<MediaStore> {
    let media = root.join(profile).join(MEDIA_DIR_NAME);
    anyhow::ensure!(
        media.is_dir(),
        "No {MEDIA_DIR_NAME} folder in profile {}",
        root.join(profile).display()
    );

    let dir = media.join(language_code);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;
    tracing::info!(path = %dir.display(), "Using Anki media directory");
    Ok(MediaStore::new(dir, language_code))
}
