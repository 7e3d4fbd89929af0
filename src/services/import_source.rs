//! Import sources: workbooks, CSV files, ZIP archives of CSVs and the
//! server-side import directory.
//!
//! Everything here is synchronous decoding into `SourceRows`; the runner
//! does the async lookups and writes afterwards.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use tracing::{debug, warn};

use super::row_parser::RawRow;
use crate::error::ImportError;
use crate::types::{EntityKind, WORKBOOK_KINDS};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Excel's largest date serial (9999-12-31)
const LAST_EXCEL_SERIAL: f64 = 2_958_465.0;

/// One data row; `line` is 1-based with the header on line 1
#[derive(Debug)]
pub struct SourceRow {
    pub line: usize,
    pub row: Result<RawRow, ImportError>,
}

/// Rows of one CSV file or workbook sheet
#[derive(Debug)]
pub struct SourceRows {
    pub kind: EntityKind,
    pub file: String,
    pub rows: Vec<SourceRow>,
}

/// An uploaded file waiting to be imported
#[derive(Debug, Clone)]
pub enum ImportSource {
    Workbook { name: String, bytes: Vec<u8> },
    Csv { name: String, kind: EntityKind, bytes: Vec<u8> },
    Archive { name: String, bytes: Vec<u8> },
}

impl ImportSource {
    /// Classify an upload by file name. `None` for unsupported files.
    pub fn from_upload(name: &str, bytes: Vec<u8>) -> Option<Self> {
        let lower = name.to_lowercase();
        let name = name.to_string();
        if lower.ends_with(".xlsx") {
            Some(ImportSource::Workbook { name, bytes })
        } else if lower.ends_with(".zip") {
            Some(ImportSource::Archive { name, bytes })
        } else {
            let kind = EntityKind::from_file_name(&name)?;
            Some(ImportSource::Csv { name, kind, bytes })
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ImportSource::Workbook { name, .. }
            | ImportSource::Csv { name, .. }
            | ImportSource::Archive { name, .. } => name,
        }
    }

    /// Entity kinds whose counters appear in the summary before any row is read
    pub fn summary_kinds(&self) -> Vec<EntityKind> {
        match self {
            ImportSource::Workbook { .. } => WORKBOOK_KINDS.to_vec(),
            ImportSource::Csv { kind, .. } => vec![*kind],
            ImportSource::Archive { .. } => Vec::new(),
        }
    }
}

// =============================================================================
// CSV
// =============================================================================

pub fn read_csv(file: &str, kind: EntityKind, bytes: &[u8]) -> Result<SourceRows, ImportError> {
    let content = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content);

    let headers = reader
        .headers()
        .map_err(|e| ImportError::unreadable(file, e))?
        .clone();

    let rows = reader
        .records()
        .enumerate()
        .map(|(idx, record)| SourceRow {
            line: idx + 2,
            row: record
                .map(|record| RawRow::from_pairs(headers.iter().zip(record.iter())))
                .map_err(|e| ImportError::MalformedRow(e.to_string())),
        })
        .collect();

    Ok(SourceRows {
        kind,
        file: file.to_string(),
        rows,
    })
}

// =============================================================================
// WORKBOOK
// =============================================================================

/// Read the known sheets of an `.xlsx` workbook. Cells are positional;
/// the first sheet row is the header and blank rows are dropped.
pub fn read_workbook(file: &str, bytes: &[u8]) -> Result<Vec<SourceRows>, ImportError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
        .map_err(|e| ImportError::unreadable(file, e))?;
    let sheet_names = workbook.sheet_names();

    let mut sheets = Vec::new();
    for kind in WORKBOOK_KINDS {
        let sheet = kind.file_token();
        let Some(columns) = kind.workbook_columns() else {
            continue;
        };
        if !sheet_names.iter().any(|name| name == sheet) {
            debug!("Workbook {} has no {} sheet", file, sheet);
            continue;
        }

        let range = workbook
            .worksheet_range(sheet)
            .map_err(|e| ImportError::unreadable(file, e))?;
        let (first_row, first_col) = range.start().unwrap_or((0, 0));

        let mut rows = Vec::new();
        for (idx, cells) in range.rows().enumerate() {
            let sheet_row = first_row as usize + idx;
            if sheet_row == 0 {
                continue;
            }
            let pairs = cells.iter().enumerate().filter_map(|(c, cell)| {
                columns
                    .get(first_col as usize + c)
                    .map(|column| (*column, cell_text(cell)))
            });
            let row = RawRow::from_pairs(pairs);
            if row.is_blank() {
                continue;
            }
            rows.push(SourceRow {
                line: sheet_row + 1,
                row: Ok(row),
            });
        }

        sheets.push(SourceRows {
            kind,
            file: format!("{}[{}]", file, sheet),
            rows,
        });
    }

    Ok(sheets)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::Bool(b) => b.to_string(),
        // Serials past 9999-12-31 stay numeric and fail date parsing per row
        Data::DateTime(dt) => Some(dt)
            .filter(|dt| dt.as_f64().abs() <= LAST_EXCEL_SERIAL)
            .and_then(|dt| dt.as_datetime())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| dt.as_f64().to_string()),
        Data::DateTimeIso(s) => s.get(..10).unwrap_or(s).to_string(),
        Data::DurationIso(s) => s.clone(),
        Data::Error(e) => e.to_string(),
    }
}

// =============================================================================
// ARCHIVE
// =============================================================================

/// Read every recognised CSV member of a ZIP archive.
///
/// The outer error means the archive itself is unreadable. A member that
/// cannot be read comes back as its own `Err` so the others still import.
pub fn read_archive(
    file: &str,
    bytes: &[u8],
) -> Result<Vec<Result<SourceRows, ImportError>>, ImportError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ImportError::unreadable(file, e))?;

    let mut members = Vec::new();
    for i in 0..archive.len() {
        let mut entry = match archive.by_index(i) {
            Ok(entry) => entry,
            Err(e) => {
                let label = format!("{}#{}", file, i);
                members.push((None, label, Err(ImportError::unreadable(file, e))));
                continue;
            }
        };
        let name = entry.name().to_string();
        if entry.is_dir() {
            continue;
        }
        let Some(kind) = EntityKind::from_file_name(&name) else {
            warn!("Could not detect import kind for '{}', skipping", name);
            continue;
        };

        let mut content = Vec::new();
        let rows = match entry.read_to_end(&mut content) {
            Ok(_) => read_csv(&name, kind, &content),
            Err(e) => Err(ImportError::unreadable(name.as_str(), e)),
        };
        members.push((Some(kind), name, rows));
    }

    members.sort_by(|a, b| (a.0, &a.1).cmp(&(b.0, &b.1)));
    Ok(members.into_iter().map(|(_, _, rows)| rows).collect())
}

// =============================================================================
// IMPORT DIRECTORY
// =============================================================================

/// Files in `dir` matching `*<Kind>*.csv`, sorted by path.
/// A missing directory has no files.
pub fn scan_directory(dir: &Path, kind: EntityKind) -> std::io::Result<Vec<PathBuf>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(|name| kind.matches_file_name(name))
            .unwrap_or(false);
        if matches && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;

    use rust_xlsxwriter::{Format, Workbook};
    use zip::write::SimpleFileOptions;

    pub enum Cell<'a> {
        Text(&'a str),
        Number(f64),
        /// Serial number formatted as `yyyy-mm-dd`
        Date(f64),
    }

    /// Build an `.xlsx` file with the given sheets
    pub fn workbook(sheets: &[(&str, Vec<Vec<Cell>>)]) -> Vec<u8> {
        let mut workbook = Workbook::new();
        let date_format = Format::new().set_num_format("yyyy-mm-dd");
        for (name, rows) in sheets {
            let sheet = workbook.add_worksheet();
            sheet.set_name(*name).unwrap();
            for (r, row) in rows.iter().enumerate() {
                for (c, cell) in row.iter().enumerate() {
                    match cell {
                        Cell::Text(text) => {
                            sheet.write_string(r as u32, c as u16, *text).unwrap();
                        }
                        Cell::Number(n) => {
                            sheet.write_number(r as u32, c as u16, *n).unwrap();
                        }
                        Cell::Date(serial) => {
                            sheet
                                .write_number_with_format(r as u32, c as u16, *serial, &date_format)
                                .unwrap();
                        }
                    }
                }
            }
        }
        workbook.save_to_buffer().unwrap()
    }

    /// Build a ZIP archive from (member name, content) pairs
    pub fn archive<C: AsRef<[u8]>>(members: &[(&str, C)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        for (name, content) in members {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_ref()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }
}
