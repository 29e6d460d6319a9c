use anyhow::Result;
use duovocab_model::{VocabularyItem, WordDefinition};

use crate::types::Language;

/// The three read operations the exporter needs from the vocabulary service.
///
/// Calls are awaited one at a time; implementations need not be `Sync`.
#[allow(async_fn_in_trait)]
pub trait VocabularyService {
    /// Languages the learner is currently studying.
    async fn languages(&self) -> Result<Vec<Language>>;

    /// The full vocabulary overview for a two-letter language code.
    async fn vocabulary(&self, language_code: &str) -> Result<Vec<VocabularyItem>>;

    /// The detail record for one lexeme id.
    async fn definition(&self, id: &str) -> Result<WordDefinition>;
}

/// Fetches raw media bytes (pronunciation audio, lexeme images) by URL.
#[allow(async_fn_in_trait)]
pub trait MediaFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}
