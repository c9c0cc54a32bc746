//! XLSX exporter
//!
//! Rows go into constant-memory worksheets named `Sheet1`, `Sheet2`, ...
//! A new sheet is started once the current one holds the per-sheet row limit
//! (the header row included). Dates and timestamps are written as native
//! Excel date-times with a number format derived from the time layout. Text
//! longer than a cell can hold is truncated. The finished workbook is written
//! through the sink in one piece.

use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tracing::{debug, warn};

use crate::cursor::{Cursor, FieldDescriptor};
use crate::error::Result;
use crate::export::progress::ProgressTracker;
use crate::export::{ExportOptions, Exporter};
use crate::formatter::{Cell, CellConverter, ValueConverter};
use crate::output::with_sink;

use super::drain_rows;

/// Rows per worksheet in the XLSX format.
pub const MAX_SHEET_ROWS: u32 = 1_048_576;

/// Characters a single cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

/// Writer for XLSX format
#[derive(Debug, Clone, Copy)]
pub struct XlsxExporter {
    sheet_row_limit: u32,
}

impl Default for XlsxExporter {
    fn default() -> Self {
        Self {
            sheet_row_limit: MAX_SHEET_ROWS,
        }
    }
}

impl XlsxExporter {
    /// Roll over to a new sheet after `limit` rows instead of the format
    /// maximum. Values are clamped to `1..=MAX_SHEET_ROWS`.
    pub fn with_sheet_row_limit(limit: u32) -> Self {
        Self {
            sheet_row_limit: limit.clamp(1, MAX_SHEET_ROWS),
        }
    }
}

/// Cell formats shared by every sheet of one workbook.
struct Formats {
    header: Format,
    date: Format,
    datetime: Format,
}

/// Tracks the sheet currently being filled.
struct SheetCursor<'a> {
    columns: &'a [FieldDescriptor],
    header: bool,
    limit: u32,
    index: usize,
    next_row: u32,
    truncated: bool,
}

impl SheetCursor<'_> {
    fn open_sheet(&mut self, workbook: &mut Workbook, formats: &Formats) -> Result<()> {
        self.index += 1;
        let name = format!("Sheet{}", self.index);
        let sheet = workbook.add_worksheet_with_constant_memory();
        sheet.set_name(&name)?;
        self.next_row = 0;

        if self.header {
            for (col, field) in self.columns.iter().enumerate() {
                sheet.write_string_with_format(0, col as u16, &field.name, &formats.header)?;
            }
            self.next_row = 1;
        }

        if self.index > 1 {
            debug!("Created new sheet {name} (row limit reached)");
        }
        Ok(())
    }

    fn write_row(&mut self, workbook: &mut Workbook, formats: &Formats, cells: &[Cell]) -> Result<()> {
        if self.next_row >= self.limit {
            self.open_sheet(workbook, formats)?;
        }

        let sheet = workbook.worksheet_from_index(self.index - 1)?;
        for (col, cell) in cells.iter().enumerate() {
            if let Cell::Text(s) = cell
                && let Some(clipped) = clip_text(s)
            {
                if !self.truncated {
                    warn!(
                        "Text longer than {MAX_CELL_CHARS} characters truncated (sheet {}, row {})",
                        self.index,
                        self.next_row + 1
                    );
                    self.truncated = true;
                }
                sheet.write_string(self.next_row, col as u16, clipped)?;
                continue;
            }
            write_cell(sheet, self.next_row, col as u16, cell, formats)?;
        }
        self.next_row += 1;
        Ok(())
    }
}

/// Prefix of `s` that fits in one cell, or `None` when `s` already fits.
fn clip_text(s: &str) -> Option<&str> {
    s.char_indices().nth(MAX_CELL_CHARS).map(|(end, _)| &s[..end])
}

fn write_cell(sheet: &mut Worksheet, row: u32, col: u16, cell: &Cell, formats: &Formats) -> Result<()> {
    match cell {
        Cell::Blank => {}
        Cell::Bool(b) => {
            sheet.write_boolean(row, col, *b)?;
        }
        Cell::Number(n) => {
            sheet.write_number(row, col, *n)?;
        }
        Cell::Text(s) => {
            sheet.write_string(row, col, s)?;
        }
        Cell::Date(d) => {
            sheet.write_datetime_with_format(row, col, d, &formats.date)?;
        }
        Cell::DateTime(ts) => {
            sheet.write_datetime_with_format(row, col, ts, &formats.datetime)?;
        }
    }
    Ok(())
}

impl Exporter for XlsxExporter {
    fn export(&self, cursor: &mut dyn Cursor, options: &ExportOptions) -> Result<u64> {
        options.validate()?;
        let time = options.time_context();
        let formats = Formats {
            header: Format::new().set_bold(),
            date: Format::new().set_num_format(time.date_layout().to_excel_format()),
            datetime: Format::new().set_num_format(time.layout().to_excel_format()),
        };
        let converter = CellConverter::new(time);
        let fields = cursor.field_descriptors().to_vec();

        debug!(
            "Preparing XLSX export (sheet_row_limit={}, compression={})",
            self.sheet_row_limit, options.compression
        );

        with_sink(&options.sink_config(), |sink| {
            let mut workbook = Workbook::new();
            let mut sheets = SheetCursor {
                columns: &fields,
                header: !options.no_header,
                limit: self.sheet_row_limit,
                index: 0,
                next_row: 0,
                truncated: false,
            };
            sheets.open_sheet(&mut workbook, &formats)?;

            let mut tracker = ProgressTracker::new("XLSX", options.progress);
            let count = drain_rows(cursor, &mut tracker, |_, values| {
                let cells = converter.convert_row(&values, &fields);
                sheets.write_row(&mut workbook, &formats, &cells)
            })?;

            debug!("Assembling workbook ({} sheets)...", sheets.index);
            let bytes = workbook.save_to_buffer()?;
            sink.emit(&bytes)?;
            tracker.finish();
            Ok(count)
        })
    }
}
