//! XLSX export of the filtered table
//!
//! The workbook has a single sheet: one header row with the table's column
//! names, then every filtered row in display order.
//!
//! | Cell | Written as |
//! |------|------------|
//! | Number | number |
//! | Text | string |
//! | Bool | boolean |
//! | Date | serial number with a date (or date-time) format |
//! | Empty | nothing |

use chrono::{NaiveDate, NaiveDateTime, Timelike};
use rust_xlsxwriter::{Format, FormatAlign, FormatBorder, Workbook, Worksheet, XlsxError};
use surveydash_core::{CellValue, RecordTable, RenderError, Renderer, Report};

/// MIME type of the exported workbook
pub const XLSX_MIME: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Largest row index a worksheet accepts (0-based)
const MAX_ROW: u32 = 1_048_575;
/// Number of columns a worksheet accepts
const MAX_COLUMNS: usize = 16_384;

/// Workbook writer for the filtered table
#[derive(Clone, Debug)]
pub struct ExcelExporter {
    /// Overrides the configured sheet name
    pub sheet_name: Option<String>,
    /// Overrides the configured sheet direction
    pub right_to_left: Option<bool>,
    /// Keep the header row visible while scrolling
    pub freeze_header: bool,
    /// Fit column widths to their contents
    pub autofit: bool,
}

impl Default for ExcelExporter {
    fn default() -> Self {
        Self {
            sheet_name: None,
            right_to_left: None,
            freeze_header: true,
            autofit: true,
        }
    }
}

struct ExportFormats {
    header: Format,
    date: Format,
    date_time: Format,
}

impl ExcelExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sheet_name(mut self, name: impl Into<String>) -> Self {
        self.sheet_name = Some(name.into());
        self
    }

    pub fn right_to_left(mut self, rtl: bool) -> Self {
        self.right_to_left = Some(rtl);
        self
    }

    pub fn no_autofit(mut self) -> Self {
        self.autofit = false;
        self
    }

    /// Workbook bytes for `table`; the table is only read
    pub fn export_table(
        &self,
        table: &RecordTable,
        sheet_name: &str,
        right_to_left: bool,
    ) -> Result<Vec<u8>, RenderError> {
        if table.columns().len() > MAX_COLUMNS {
            return Err(RenderError::InvalidData(format!(
                "{} columns do not fit in one worksheet",
                table.columns().len()
            )));
        }
        if table.len() > MAX_ROW as usize {
            return Err(RenderError::InvalidData(format!(
                "{} rows do not fit in one worksheet",
                table.len()
            )));
        }

        let mut workbook = Workbook::new();
        let formats = create_formats();
        let sheet = workbook.add_worksheet();
        let sheet_name = self.sheet_name.as_deref().unwrap_or(sheet_name);
        let rtl = self.right_to_left.unwrap_or(right_to_left);

        self.write_sheet(sheet, table, sheet_name, rtl, &formats)
            .map_err(|e| RenderError::Format(format!("Failed to write sheet: {e}")))?;

        workbook
            .save_to_buffer()
            .map_err(|e| RenderError::Format(format!("Failed to create Excel: {e}")))
    }

    fn write_sheet(
        &self,
        sheet: &mut Worksheet,
        table: &RecordTable,
        sheet_name: &str,
        rtl: bool,
        formats: &ExportFormats,
    ) -> Result<(), XlsxError> {
        sheet.set_name(sheet_name)?;
        sheet.set_right_to_left(rtl);

        for (col, name) in table.columns().iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, name, &formats.header)?;
        }

        for (r, row) in table.rows().iter().enumerate() {
            let excel_row = r as u32 + 1;
            for (c, cell) in row.iter().enumerate() {
                let col = c as u16;
                match cell {
                    CellValue::Empty => {}
                    CellValue::Number(n) if n.is_finite() => {
                        sheet.write_number(excel_row, col, *n)?;
                    }
                    // NaN and infinities have no spreadsheet representation
                    CellValue::Number(n) => {
                        sheet.write_string(excel_row, col, n.to_string())?;
                    }
                    CellValue::Text(s) => {
                        sheet.write_string(excel_row, col, s)?;
                    }
                    CellValue::Bool(b) => {
                        sheet.write_boolean(excel_row, col, *b)?;
                    }
                    CellValue::Date(dt) => {
                        let format = if dt.time().num_seconds_from_midnight() == 0 {
                            &formats.date
                        } else {
                            &formats.date_time
                        };
                        sheet.write_number_with_format(excel_row, col, excel_serial(dt), format)?;
                    }
                }
            }
        }

        if self.freeze_header {
            sheet.set_freeze_panes(1, 0)?;
        }
        if self.autofit {
            sheet.autofit();
        }
        Ok(())
    }
}

fn create_formats() -> ExportFormats {
    ExportFormats {
        header: Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_background_color(0x4472C4)
            .set_font_color(0xFFFFFF)
            .set_border(FormatBorder::Thin),
        date: Format::new().set_num_format("yyyy-mm-dd"),
        date_time: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
    }
}

/// Days since the 1900 date system epoch, with the time as a fraction
pub fn excel_serial(dt: &NaiveDateTime) -> f64 {
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or_default();
    let elapsed = *dt - epoch;
    elapsed.num_seconds() as f64 / 86_400.0
}

impl Renderer for ExcelExporter {
    type Output = Vec<u8>;

    fn render(&self, report: &Report) -> Result<Vec<u8>, RenderError> {
        self.export_table(
            &report.filtered,
            &report.config.export_sheet_name,
            report.config.right_to_left,
        )
    }
}
