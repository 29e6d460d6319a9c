use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use duovocab_acquire::{Language, MediaFetcher, VocabularyService};
use duovocab_model::merge::{self, MergeStats};
use duovocab_model::{FieldSet, VocabularyItem};

pub mod anki;
pub mod media;
pub mod rows;
pub mod tsv;

pub use media::MediaStore;
pub use rows::Example;

/// Everything the export needs, gathered up front (prompts, flags).
#[derive(Debug, Clone)]
pub struct ExportSettings {
    pub language: Language,
    pub fields: FieldSet,
    /// Directory holding `<language>.tsv`.
    pub output_dir: PathBuf,
    /// Where to download media; `None` keeps remote URLs.
    pub media: Option<MediaStore>,
}

impl ExportSettings {
    pub fn table_path(&self) -> PathBuf {
        self.output_dir.join(self.language.table_file_name())
    }
}

/// What a run did to the table file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    /// The service returned no vocabulary; nothing written.
    NoVocabulary,
    /// Every overview id is already in the table; file left untouched.
    UpToDate { path: PathBuf, rows: usize },
    /// New rows were fetched and the table rewritten.
    Written {
        path: PathBuf,
        stats: MergeStats,
        details_fetched: usize,
    },
}

/// Incrementally export a learner's vocabulary for one language.
///
/// Fetches the overview, then hands off to [`export_overview`].
pub async fn export<S, F>(service: &S, fetcher: &F, settings: &ExportSettings) -> Result<ExportOutcome>
where
    S: VocabularyService,
    F: MediaFetcher,
{
    let lang = &settings.language;
    let overview = service
        .vocabulary(&lang.code)
        .await
        .with_context(|| format!("Failed to fetch vocabulary for {}", lang.name))?;
    export_overview(service, fetcher, settings, &overview, None).await
}

/// Row count of the table at `path` when it already holds every overview id.
///
/// `None` means there is something to export (or no table yet), so callers
/// can skip field and media prompts on a run with nothing new.
pub fn up_to_date(path: &Path, overview: &[VocabularyItem]) -> Option<usize> {
    let table = tsv::load_table(path)?;
    merge::new_items(overview, Some(&table))
        .is_empty()
        .then_some(table.len())
}

/// Export an already fetched overview.
///
/// Skips ids already present in the existing table, builds rows for the
/// rest (one detail request per item that needs it, except the `example`
/// item whose detail is already known), merges and rewrites the table.
/// Requests run strictly one after another.
pub async fn export_overview<S, F>(
    service: &S,
    fetcher: &F,
    settings: &ExportSettings,
    overview: &[VocabularyItem],
    example: Option<&Example>,
) -> Result<ExportOutcome>
where
    S: VocabularyService,
    F: MediaFetcher,
{
    let path = settings.table_path();
    let lang = &settings.language;

    if overview.is_empty() {
        tracing::warn!(lang = %lang.code, "Vocabulary overview is empty, nothing to export");
        return Ok(ExportOutcome::NoVocabulary);
    }

    let existing = tsv::load_table(&path);
    let fresh = merge::new_items(overview, existing.as_ref());
    if let Some(table) = &existing {
        if fresh.is_empty() {
            tracing::info!(path = %path.display(), rows = table.len(), "Table is up to date");
            return Ok(ExportOutcome::UpToDate {
                path,
                rows: table.len(),
            });
        }
    }
    tracing::info!(
        lang = %lang.code,
        overview = overview.len(),
        new = fresh.len(),
        "Exporting new vocabulary"
    );

    let total = fresh.len();
    let mut new_rows = Vec::with_capacity(total);
    let mut details_fetched = 0;
    for (i, item) in fresh.into_iter().enumerate() {
        let known = example.and_then(|e| e.definition_for(&item.id));
        let (row, fetched) = rows::build_row(
            service,
            fetcher,
            item,
            known,
            &settings.fields,
            settings.media.as_ref(),
        )
        .await?;
        if fetched {
            details_fetched += 1;
        }
        tracing::info!(
            progress = %format!("{}/{total}", i + 1),
            id = %item.id,
            word = item.word().unwrap_or_default(),
            "Processed word"
        );
        new_rows.push(row);
    }

    let result = merge::merge(existing, &settings.fields.columns(), new_rows);
    if result.stats.dropped_duplicates > 0 {
        tracing::warn!(dropped = result.stats.dropped_duplicates, "Dropped duplicate rows");
    }
    tsv::save_table(&path, &result.table)?;

    Ok(ExportOutcome::Written {
        path,
        stats: result.stats,
        details_fetched,
    })
}
