use anyhow::{Context, Result};
use duovocab_acquire::MediaFetcher;
use duovocab_model::MediaKind;
use std::fs;
use std::path::{Path, PathBuf};

/// A per-language directory inside Anki's media store.
///
/// Files land in `dir`; cards reference them as `{prefix}/{filename}`,
/// relative to `collection.media`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStore {
    dir: PathBuf,
    prefix: String,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_of(&self, filename: &str) -> PathBuf {
        self.dir.join(filename)
    }

    pub fn reference(&self, filename: &str) -> String {
        format!("{}/{filename}", self.prefix)
    }
}

/// Content-stable file name: md5 of the word text plus the kind's extension.
pub fn media_filename(word: &str, kind: MediaKind) -> String {
    format!("{:x}{}", md5::compute(word.as_bytes()), kind.extension())
}

/// Resolve one media field to the reference a card should use.
///
/// - empty source value: `None`
/// - no store (download declined): the remote URL as-is
/// - otherwise: download into the store unless the file is already there,
///   and return the store-relative reference
///
/// A failed download keeps the remote URL so the card still works online.
/// Failing to write into the store is an error.
pub async fn resolve<F: MediaFetcher>(
    fetcher: &F,
    store: Option<&MediaStore>,
    kind: MediaKind,
    word: &str,
    value: Option<&str>,
) -> Result<Option<String>> {
    let url = match value.map(str::trim).filter(|v| !v.is_empty()) {
        Some(url) => url,
        None => return Ok(None),
    };
    let store = match store {
        Some(store) => store,
        None => return Ok(Some(url.to_string())),
    };

    let filename = media_filename(word, kind);
    let path = store.path_of(&filename);

    if fs::metadata(&path).map(|m| m.len() > 0).unwrap_or(false) {
        tracing::debug!(path = %path.display(), "Media already downloaded");
        return Ok(Some(store.reference(&filename)));
    }

    let bytes = match fetcher.fetch(url).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(word = %word, url = %url, error = %format!("{e:#}"), "Media download failed, keeping remote URL");
            return Ok(Some(url.to_string()));
        }
    };

    // Land under a temporary name so an interrupted write is never reused.
    let part = store.path_of(&format!("{filename}.part"));
    fs::write(&part, &bytes).with_context(|| format!("Failed to write {}", part.display()))?;
    fs::rename(&part, &path)
        .with_context(|| format!("Failed to move media into {}", path.display()))?;
    tracing::debug!(path = %path.display(), bytes = bytes.len(), "Saved media");
    Ok(Some(store.reference(&filename)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct StubFetcher {
        calls: RefCell<Vec<String>>,
        fail: bool,
    }

    impl MediaFetcher for StubFetcher {
        async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(url.to_string());
            anyhow::ensure!(!self.fail, "connection reset");
            Ok(format!("bytes of {url}").into_bytes())
        }
    }

    #[test]
    fn test_filename_is_md5_of_word() {
        assert_eq!(
            media_filename("hello", MediaKind::Audio),
            "5d41402abc4b2a76b9719d911017c592.mp3"
        );
        assert_eq!(
            media_filename("hello", MediaKind::Image),
            "5d41402abc4b2a76b9719d911017c592.svg"
        );
    }

    #[test]
    fn test_filename_deterministic() {
        assert_eq!(
            media_filename("perro", MediaKind::Audio),
            media_filename("perro", MediaKind::Audio)
        );
        assert_ne!(
            media_filename("perro", MediaKind::Audio),
            media_filename("gato", MediaKind::Audio)
        );
    }

    #[tokio::test]
    async fn test_empty_value() {
        let fetcher = StubFetcher::default();
        let got = resolve(&fetcher, None, MediaKind::Audio, "perro", Some("")).await.unwrap();
        assert_eq!(got, None);
        let got = resolve(&fetcher, None, MediaKind::Audio, "perro", None).await.unwrap();
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn test_no_store_keeps_url() {
        let fetcher = StubFetcher::default();
        let got = resolve(&fetcher, None, MediaKind::Audio, "perro", Some("https://cdn/x.mp3"))
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some("https://cdn/x.mp3"));
        assert!(fetcher.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_download_and_reuse() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "es");
        let fetcher = StubFetcher::default();
        let url = Some("https://cdn/perro.svg");

        let first = resolve(&fetcher, Some(&store), MediaKind::Image, "perro", url)
            .await
            .unwrap();
        let filename = media_filename("perro", MediaKind::Image);
        assert_eq!(first, Some(format!("es/{filename}")));
        assert_eq!(
            fs::read(store.path_of(&filename)).unwrap(),
            b"bytes of https://cdn/perro.svg"
        );

        let second = resolve(&fetcher, Some(&store), MediaKind::Image, "perro", url)
            .await
            .unwrap();
        assert_eq!(second, first);
        assert_eq!(fetcher.calls.borrow().len(), 1);
        assert!(!store.path_of(&format!("{filename}.part")).exists());
    }

    #[tokio::test]
    async fn test_leftover_partial_download_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "es");
        let fetcher = StubFetcher::default();
        let filename = media_filename("perro", MediaKind::Audio);
        fs::write(store.path_of(&format!("{filename}.part")), b"trunc").unwrap();

        let got = resolve(&fetcher, Some(&store), MediaKind::Audio, "perro", Some("https://cdn/p.mp3"))
            .await
            .unwrap();
        assert_eq!(got, Some(format!("es/{filename}")));
        assert_eq!(fetcher.calls.borrow().len(), 1);
        assert_eq!(fs::read(store.path_of(&filename)).unwrap(), b"bytes of https://cdn/p.mp3");
        assert!(!store.path_of(&format!("{filename}.part")).exists());
    }

    #[tokio::test]
    async fn test_failed_download_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let store = MediaStore::new(dir.path(), "es");
        let fetcher = StubFetcher {
            fail: true,
            ..Default::default()
        };
        let got = resolve(&fetcher, Some(&store), MediaKind::Audio, "perro", Some("https://cdn/p.mp3"))
            .await
            .unwrap();
        assert_eq!(got.as_deref(), Some("https://cdn/p.mp3"));
        assert!(!store.path_of(&media_filename("perro", MediaKind::Audio)).exists());
    }
}
