//! Excel output via `rust_xlsxwriter`.

use reportmap_core::{Cell, Workbook};
use rust_xlsxwriter::{
    DocProperties, ExcelDateTime, Format, Workbook as XlsxWorkbook, Worksheet, XlsxError,
};
use std::path::Path;

/// Write every sheet of `workbook` to an `.xlsx` file at `path`.
///
/// The document creation time is pinned so identical workbooks produce
/// identical files.
pub fn write_workbook(workbook: &Workbook, path: &Path) -> Result<(), XlsxError> {
    let mut xlsx = XlsxWorkbook::new();
    let created = ExcelDateTime::from_ymd(2000, 1, 1)?;
    let properties = DocProperties::new().set_creation_datetime(&created);
    xlsx.set_properties(&properties);
    let header_format = Format::new().set_bold();

    for sheet in &workbook.sheets {
        let worksheet = xlsx.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        write_header(worksheet, &sheet.headers, &header_format)?;
        for (i, row) in sheet.rows.iter().enumerate() {
            let row_idx = u32::try_from(i + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
            for (col, cell) in row.iter().enumerate() {
                let col_idx = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
                write_cell(worksheet, row_idx, col_idx, cell)?;
            }
        }
        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
    }

    xlsx.save(path)
}

fn write_header(worksheet: &mut Worksheet, headers: &[String], format: &Format) -> Result<(), XlsxError> {
    for (col, header) in headers.iter().enumerate() {
        let col_idx = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string_with_format(0, col_idx, header, format)?;
    }
    Ok(())
}

fn write_cell(worksheet: &mut Worksheet, row: u32, col: u16, cell: &Cell) -> Result<(), XlsxError> {
    match cell {
        Cell::Text(text) => {
            worksheet.write_string(row, col, text)?;
        },
        Cell::Number(n) => {
            worksheet.write_number(row, col, *n)?;
        },
        Cell::Empty => {},
    }
    Ok(())
}
