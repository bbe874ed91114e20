use anyhow::{Context, Result};
use csv::{Terminator, WriterBuilder};
use std::{fs, io::Write, path::Path};
use tempfile::NamedTempFile;
use tracing::info;

use super::join::MergedRecord;

/// Serialize `records` under `headers` into any writer. Lines end in `\r\n`,
/// like the files this tool regenerates.
pub fn write_records<W: Write>(writer: W, headers: &[String], records: &[MergedRecord]) -> Result<()> {
    let mut wtr = WriterBuilder::new()
        .terminator(Terminator::CRLF)
        .from_writer(writer);
    wtr.write_record(headers).context("writing header row")?;
    for record in records {
        wtr.write_record(record.to_fields())
            .with_context(|| format!("writing row {}", record.key))?;
    }
    wtr.flush().context("flushing CSV writer")?;
    Ok(())
}

/// Write to a temp file next to `path`, then rename it into place.
/// Nothing is left at `path` if serialization fails.
#[tracing::instrument(level = "info", skip(headers, records), fields(path = %path.display()))]
pub fn write_output(path: &Path, headers: &[String], records: &[MergedRecord]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).with_context(|| format!("creating output directory {:?}", dir))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("creating temp file in {:?}", dir))?;
    write_records(tmp.as_file_mut(), headers, records)
        .with_context(|| format!("serializing {:?}", path))?;
    tmp.as_file().sync_all().context("syncing temp file")?;
    tmp.persist(path)
        .with_context(|| format!("moving output into place at {:?}", path))?;

    info!(rows = records.len(), "wrote output");
    Ok(())
}
