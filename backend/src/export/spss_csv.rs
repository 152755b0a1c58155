//! SPSS-ready CSV output.

use std::io::Write;
use std::path::Path;

use crate::error::ExportResult;
use crate::models::SpssTable;

/// Write the table as comma-separated UTF-8 with a header row; nulls are empty fields.
pub fn write_spss_csv<W: Write>(table: &SpssTable, writer: W) -> ExportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(table.column_names())?;
    for row in 0..table.row_count() {
        csv_writer.write_record(table.columns().iter().map(|c| c.data.get(row).to_text()))?;
    }

    csv_writer.flush()?;
    Ok(())
}

/// Serialize to an in-memory CSV string.
pub fn spss_csv_string(table: &SpssTable) -> ExportResult<String> {
    let mut buf = Vec::new();
    write_spss_csv(table, &mut buf)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Write the table to `path`.
pub fn save_spss_csv(table: &SpssTable, path: &Path) -> ExportResult<()> {
    let file = std::fs::File::create(path)?;
    write_spss_csv(table, std::io::BufWriter::new(file))
}
