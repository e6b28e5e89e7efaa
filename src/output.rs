use std::fs::File;
use std::io::Write;
use std::path::Path;

use tracing::info;

use crate::error::{Result, ScrapeError};

/// A record that can be laid out as one delimited row
pub trait CsvRow {
    /// Rendered value for `column`, or `None` if the record has no such column.
    /// Absent fields render as an empty string, not `None`.
    fn cell(&self, column: &str) -> Option<String>;
}

/// Lay out every record in `columns` order.
///
/// Fails on the first record missing a named column, before anything is written.
fn render_rows<R, C>(columns: &[C], records: &[R]) -> Result<Vec<Vec<String>>>
where
    R: CsvRow,
    C: AsRef<str>,
{
    records
        .iter()
        .map(|record| {
            columns
                .iter()
                .map(|column| {
                    let column = column.as_ref();
                    record.cell(column).ok_or_else(|| ScrapeError::MissingColumn {
                        column: column.to_string(),
                    })
                })
                .collect::<Result<Vec<_>>>()
        })
        .collect()
}

fn write_rendered<W, C>(out: W, columns: &[C], rows: &[Vec<String>]) -> Result<usize>
where
    W: Write,
    C: AsRef<str>,
{
    let mut writer = csv::Writer::from_writer(out);
    writer.write_record(columns.iter().map(AsRef::as_ref))?;
    for row in rows {
        writer.write_record(row)?;
    }
    writer.flush()?;
    Ok(rows.len())
}

/// Write a header row then one row per record, cells taken in `columns` order.
///
/// Returns the number of data rows written. A record missing any named column
/// aborts the write with nothing emitted, header included.
pub fn write_rows<W, R, C>(out: W, columns: &[C], records: &[R]) -> Result<usize>
where
    W: Write,
    R: CsvRow,
    C: AsRef<str>,
{
    let rows = render_rows(columns, records)?;
    write_rendered(out, columns, &rows)
}

/// Write `records` to a new file at `path`, creating parent directories.
/// No file is created when a record cannot be laid out.
pub fn write_csv_file<R, C>(path: &Path, columns: &[C], records: &[R]) -> Result<usize>
where
    R: CsvRow,
    C: AsRef<str>,
{
    let rows = render_rows(columns, records)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let written = write_rendered(file, columns, &rows)?;
    info!("💾 Wrote {} rows to {}", written, path.display());
    Ok(written)
}
