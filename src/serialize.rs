use crate::error::Result;
use crate::matrix::{adjacency_matrix, ResolvedAdjacencyEntry};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// AMD-style wrapper letting a front-end consumer load the payload as a named
/// data module. The `{{data}}` placeholder receives the serialized JSON.
const DATA_MODULE_TEMPLATE: &str = "\ndefine(function() {\n  result = {{data}}\n  return result\n})\n";

/// Writes pretty-printed JSON. No schema validation; the caller guarantees
/// `data` is serializable.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)?;
    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Writes the payload embedded in the loader-module template.
pub fn write_data_module<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string(data)?;
    let text = DATA_MODULE_TEMPLATE.replace("{{data}}", &json);
    std::fs::write(path, text)?;
    info!("Wrote {}", path.display());
    Ok(())
}

/// Writes the adjacency grid as CSV: header row `Country, <codes...>`, then
/// one row per code with 0/1 flags in the fixed code order.
pub fn write_adjacency_csv(
    path: &Path,
    entries: &[ResolvedAdjacencyEntry],
    ordering: &[&str],
) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;

    let mut header = vec!["Country"];
    header.extend_from_slice(ordering);
    writer.write_record(&header)?;

    let matrix = adjacency_matrix(entries, ordering);
    for (code, row) in ordering.iter().zip(matrix) {
        let mut record = vec![code.to_string()];
        record.extend(row.iter().map(u8::to_string));
        writer.write_record(&record)?;
    }

    writer.flush()?;
    info!("Wrote {}", path.display());
    Ok(())
}
