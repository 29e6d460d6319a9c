use anyhow::{Context, Result};
use duovocab_acquire::{MediaFetcher, VocabularyService};
use duovocab_model::{
    render_cell, word_text, Attributes, FieldSet, OutputRow, VocabularyItem, WordDefinition,
};
use serde_json::Value;

use crate::media::{self, MediaStore};

/// Build the output row for one new vocabulary item.
///
/// The detail record is only fetched when the overview lacks a selected
/// field and `known` does not already hold it. Returns the row and whether
/// a detail fetch happened.
pub async fn build_row<S, F>(
    service: &S,
    fetcher: &F,
    item: &VocabularyItem,
    known: Option<&WordDefinition>,
    fields: &FieldSet,
    store: Option<&MediaStore>,
) -> Result<(OutputRow, bool)>
where
    S: VocabularyService,
    F: MediaFetcher,
{
    let mut fetched = false;
    let definition = if item.covers(fields.fields()) {
        None
    } else if let Some(def) = known {
        Some(def.clone())
    } else {
        let def = service
            .definition(&item.id)
            .await
            .with_context(|| format!("Failed to fetch definition for {}", item.id))?;
        fetched = true;
        Some(def)
    };
    let record = item.merged_with(definition.as_ref());

    let mut row = text_row(&item.id, &record, fields);

    // Media files are keyed by word text; fall back to the id for records
    // without one so names stay unique.
    let word = word_text(&record).unwrap_or(item.id.as_str()).to_string();
    for kind in fields.media_kinds() {
        let value = record.get(kind.field()).and_then(Value::as_str);
        let reference = media::resolve(fetcher, store, kind, &word, value).await?;
        row.set(kind.column(), kind.render(reference.as_deref()));
    }

    Ok((row, fetched))
}

/// The first overview item together with its detail record.
///
/// `record` is what the field selector offers fields from; the definition is
/// handed back to the export so the item is not fetched twice.
#[derive(Debug, Clone)]
pub struct Example {
    pub id: String,
    pub definition: WordDefinition,
    pub record: Attributes,
}

impl Example {
    /// The detail record, if this example is for `id`.
    pub fn definition_for(&self, id: &str) -> Option<&WordDefinition> {
        (self.id == id).then_some(&self.definition)
    }
}

/// Fetch the [`Example`] for an overview. `None` for an empty overview.
pub async fn example_record<S: VocabularyService>(
    service: &S,
    overview: &[VocabularyItem],
) -> Result<Option<Example>> {
    let Some(first) = overview.first() else {
        return Ok(None);
    };
    let definition = service
        .definition(&first.id)
        .await
        .with_context(|| format!("Failed to fetch definition for {}", first.id))?;
    let record = first.merged_with(Some(&definition));
    Ok(Some(Example {
        id: first.id.clone(),
        definition,
        record,
    }))
}

/// Row holding the plain (non-media) selected fields of a merged record.
pub fn text_row(id: &str, record: &Attributes, fields: &FieldSet) -> OutputRow {
    let mut row = OutputRow::new(id);
    for field in fields.text_fields() {
        row.set(field, render_cell(record.get(field)));
    }
    row
}
