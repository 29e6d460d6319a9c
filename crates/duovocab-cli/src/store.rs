use anyhow::Result;
use duovocab_export::{anki, MediaStore};
use duovocab_model::FieldSet;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::prompt::Prompter;

const DOWNLOAD_HELP: &str = "Downloading media will take longer and can require manually telling \
the tool where to find the correct destination folder in order for Anki to find them. However, \
this will allow you to have access to the information even when you are not connected to the \
internet";

/// Ask whether to download media and, if so, locate the Anki media folder.
///
/// Only asked when the selection includes `tts` or `lexeme_image`.
/// `anki_dir` overrides the platform default data directory.
pub fn media_store<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    fields: &FieldSet,
    language_code: &str,
    anki_dir: Option<PathBuf>,
) -> Result<Option<MediaStore>> {
    if !fields.wants_media() {
        return Ok(None);
    }
    let download = prompter.confirm(
        "Do you want to download media files to your computer? [Default: NO] (y/N/?) ",
        DOWNLOAD_HELP,
    )?;
    if !download {
        return Ok(None);
    }

    let root = anki_root(prompter, anki_dir.or_else(anki::default_anki_root))?;
    let profiles = anki::find_profiles(&root)?;
    let profile = match profiles.len() {
        0 => anyhow::bail!("No user found in Anki directory {}", root.display()),
        1 => &profiles[0],
        _ => &profiles[prompter.choose("Select user folder (enter number): ", &profiles)?],
    };
    tracing::info!(profile = %profile, "Selected Anki profile");

    Ok(Some(anki::ensure_media_dir(&root, profile, language_code)?))
}

/// Keep asking until the Anki data directory exists.
fn anki_root<R: BufRead, W: Write>(
    prompter: &mut Prompter<R, W>,
    candidate: Option<PathBuf>,
) -> Result<PathBuf> {
    let mut root = candidate.unwrap_or_default();
    while !root.is_dir() {
        prompter.say(format!("{} is not a valid path.", root.display()))?;
        root = PathBuf::from(prompter.ask("Please enter the location where Anki stores its data:  ")?);
        prompter.say("")?;
    }
    Ok(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::scripted;
    use duovocab_export::anki::MEDIA_DIR_NAME;
    use std::fs;
    use std::path::Path;

    fn make_profile(root: &Path, name: &str) {
        fs::create_dir_all(root.join(name).join(MEDIA_DIR_NAME)).unwrap();
    }

    #[test]
    fn test_no_media_fields_asks_nothing() {
        let mut p = scripted("");
        let store = media_store(&mut p, &FieldSet::new(["word"]), "es", None).unwrap();
        assert!(store.is_none());
        assert!(p.into_output().is_empty());
    }

    #[test]
    fn test_declined_download() {
        let mut p = scripted("\n");
        let store = media_store(&mut p, &FieldSet::default(), "es", None).unwrap();
        assert!(store.is_none());
    }

    #[test]
    fn test_single_profile_chosen_automatically() {
        let dir = tempfile::tempdir().unwrap();
        make_profile(dir.path(), "User 1");
        let mut p = scripted("y\n");
        let store = media_store(&mut p, &FieldSet::default(), "es", Some(dir.path().into()))
            .unwrap()
            .unwrap();
        assert_eq!(store.dir(), dir.path().join("User 1").join(MEDIA_DIR_NAME).join("es"));
    }

    #[test]
    fn test_bad_path_then_profile_choice() {
        let dir = tempfile::tempdir().unwrap();
        make_profile(dir.path(), "Alice");
        make_profile(dir.path(), "Bob");
        let answers = format!("y\n{}\n7\n1\n", dir.path().display());
        let mut p = scripted(&answers);
        let missing = dir.path().join("missing");

        let store = media_store(&mut p, &FieldSet::new(["tts"]), "de", Some(missing))
            .unwrap()
            .unwrap();
        assert_eq!(store.dir(), dir.path().join("Bob").join(MEDIA_DIR_NAME).join("de"));

        let out = String::from_utf8(p.into_output()).unwrap();
        assert!(out.contains("is not a valid path."));
        assert!(out.contains("Invalid selection"));
    }

    #[test]
    fn test_no_profiles_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let mut p = scripted("y\n");
        let result = media_store(&mut p, &FieldSet::default(), "es", Some(dir.path().into()));
        assert!(result.is_err());
    }
}
