use crate::storage::traits::StorageResult;
use crate::storage::PageRecord;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Writes records to a JSON corpus file as an array sorted by identifier
///
/// # Arguments
///
/// * `path` - Destination file; created or truncated
/// * `records` - The records to write, in any order
///
/// # Returns
///
/// The number of records written
pub fn save_corpus<'a>(
    path: &Path,
    records: impl IntoIterator<Item = &'a PageRecord>,
) -> StorageResult<usize> {
    let mut sorted: Vec<&PageRecord> = records.into_iter().collect();
    sorted.sort_by(|a, b| a.identifier.cmp(&b.identifier));

    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, &sorted)?;
    writer.write_all(b"\n")?;
    writer.flush()?;

    Ok(sorted.len())
}

/// Reads a JSON corpus file written by [`save_corpus`]
pub fn load_corpus(path: &Path) -> StorageResult<Vec<PageRecord>> {
    let reader = BufReader::new(File::open(path)?);
    let records = serde_json::from_reader(reader)?;
    Ok(records)
}
