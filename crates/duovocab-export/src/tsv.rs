use anyhow::{Context, Result};
use duovocab_model::{OutputTable, TableError};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;

const DELIMITER: u8 = b'\t';

/// Parse a tab-separated table whose first column is the unlabeled row id.
pub fn read_table<R: Read>(reader: R) -> Result<OutputTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers = rdr.headers().context("Failed to read table header")?.clone();
    if headers.is_empty() {
        return Err(TableError::MissingHeader.into());
    }
    let columns: Vec<String> = headers.iter().skip(1).map(str::to_string).collect();

    let mut records = Vec::new();
    for record in rdr.records() {
        let record = record.context("Failed to read table row")?;
        records.push(record.iter().map(str::to_string).collect());
    }

    Ok(OutputTable::from_records(columns, records)?)
}

/// Serialize a table: unlabeled id column first, then the table's columns.
pub fn write_table<W: Write>(writer: W, table: &OutputTable) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .quote_style(csv::QuoteStyle::Necessary)
        .from_writer(writer);

    let header = std::iter::once("").chain(table.columns.iter().map(String::as_str));
    wtr.write_record(header)?;
    for row in &table.rows {
        wtr.write_record(table.record(row))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Load a previously exported table.
///
/// A missing file and an unreadable file both mean "no prior data": the
/// caller resyncs everything. Only the latter is worth a warning.
pub fn load_table(path: &Path) -> Option<OutputTable> {
    let file = match fs::File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No existing table");
            return None;
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot open existing table, starting fresh");
            return None;
        }
    };

    match read_table(file) {
        Ok(table) if table.is_empty() => {
            tracing::debug!(path = %path.display(), "Existing table has a header but no rows");
            Some(table)
        }
        Ok(table) => {
            tracing::info!(path = %path.display(), rows = table.len(), "Loaded existing table");
            Some(table)
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %format!("{e:#}"), "Existing table is malformed, starting fresh");
            None
        }
    }
}

/// Write the table next to its final location, then move it into place.
pub fn save_table(path: &Path, table: &OutputTable) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }

    let tmp = path.with_extension("tsv.tmp");
    let file = fs::File::create(&tmp)
        .with_context(|| format!("Failed to create {}", tmp.display()))?;
    write_table(std::io::BufWriter::new(file), table)?;
    fs::rename(&tmp, path)
        .with_context(|| format!("Failed to move table into {}", path.display()))?;

    tracing::info!(path = %path.display(), rows = table.len(), columns = table.columns.len(), "Wrote table");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use duovocab_model::OutputRow;

    fn sample() -> OutputTable {
        let mut table = OutputTable::new(vec!["word".to_string(), "translations".to_string()]);
        let mut a = OutputRow::new("a1");
        a.set("word", "perro");
        a.set("translations", "dog, hound");
        let mut b = OutputRow::new("b2");
        b.set("word", "gato");
        b.set("translations", "None");
        table.rows.push(a);
        table.rows.push(b);
        table
    }

    #[test]
    fn test_write_layout() {
        let mut buf = Vec::new();
        write_table(&mut buf, &sample()).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(
            text,
            "\tword\ttranslations\na1\tperro\tdog, hound\nb2\tgato\tNone\n"
        );
    }

    #[test]
    fn test_read_written_table() {
        let mut buf = Vec::new();
        write_table(&mut buf, &sample()).unwrap();
        let table = read_table(buf.as_slice()).unwrap();
        assert_eq!(table, sample());
    }

    #[test]
    fn test_html_cells_survive() {
        let mut table = OutputTable::new(vec!["audio".to_string()]);
        let mut row = OutputRow::new("a1");
        row.set("audio", "<audio controls><source src='es/x.mp3' type='audio/mpeg'></audio>");
        table.rows.push(row);

        let mut buf = Vec::new();
        write_table(&mut buf, &table).unwrap();
        assert_eq!(read_table(buf.as_slice()).unwrap(), table);
    }

    #[test]
    fn test_ragged_table_is_error() {
        let text = "\tword\tpos\na1\tperro\n";
        assert!(read_table(text.as_bytes()).is_err());
    }

    #[test]
    fn test_load_missing_and_malformed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spanish.tsv");
        assert!(load_table(&path).is_none());

        fs::write(&path, "\tword\n\tperro\n").unwrap();
        assert!(load_table(&path).is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("spanish.tsv");
        save_table(&path, &sample()).unwrap();
        assert_eq!(load_table(&path), Some(sample()));
        assert!(!path.with_extension("tsv.tmp").exists());
    }
}
