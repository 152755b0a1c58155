//! Spreadsheet export of merged tables, one worksheet per dataset.

use std::path::Path;

use rust_xlsxwriter::{Format, Workbook, Worksheet};

use crate::error::{ExportError, ExportResult};
use crate::models::{CellValue, MergedTable};

/// Excel's hard limits.
const MAX_ROWS: usize = 1_048_576;
const MAX_COLUMNS: usize = 16_384;

/// Build a workbook in memory from `(sheet name, table)` pairs.
///
/// Header row = column names. Integers are written as numbers, text as
/// strings (RecordIDs keep their leading zeros), nulls are left blank.
pub fn write_workbook(sheets: &[(&str, &MergedTable)]) -> ExportResult<Vec<u8>> {
    let mut workbook = build_workbook(sheets)?;
    Ok(workbook.save_to_buffer()?)
}

/// Same as [`write_workbook`], saved to `path`.
pub fn save_workbook(sheets: &[(&str, &MergedTable)], path: &Path) -> ExportResult<()> {
    let mut workbook = build_workbook(sheets)?;
    workbook.save(path)?;
    Ok(())
}

fn build_workbook(sheets: &[(&str, &MergedTable)]) -> ExportResult<Workbook> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    for (name, table) in sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(*name)?;
        write_sheet(worksheet, name, table, &header_format)?;
    }

    Ok(workbook)
}

fn write_sheet(
    worksheet: &mut Worksheet,
    name: &str,
    table: &MergedTable,
    header_format: &Format,
) -> ExportResult<()> {
    let rows = table.row_count();
    let columns = table.column_count();
    if rows + 1 > MAX_ROWS || columns > MAX_COLUMNS {
        return Err(ExportError::SheetTooLarge { sheet: name.to_string(), rows, columns });
    }

    for (c, column) in table.columns().iter().enumerate() {
        let col = c as u16;
        worksheet.write_string_with_format(0, col, column.name.as_str(), header_format)?;

        for r in 0..column.data.len() {
            let row = (r + 1) as u32;
            match column.data.get(r) {
                CellValue::Integer(n) => {
                    worksheet.write_number(row, col, n as f64)?;
                }
                CellValue::Text(s) if !s.is_empty() => {
                    worksheet.write_string(row, col, s)?;
                }
                CellValue::Text(_) | CellValue::Null => {}
            }
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Column;
    use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
    use std::io::Cursor;

    fn sample_table() -> MergedTable {
        MergedTable::new(vec![
            Column::text("RecordID (Value)", vec!["0042".into(), "1046".into()]),
            Column::text("RecordID (Label)", vec!["0042".into(), "1046".into()]),
            Column::integer("Q1. Agree? (Value)", vec![Some(1), None]),
            Column::text("Q1. Agree? (Label)", vec!["Agree".into(), "N/A".into()]),
        ])
    }

    #[test]
    fn test_workbook_round_trip() {
        let pre = sample_table();
        let post = MergedTable::new(vec![Column::text("RecordID (Value)", vec!["9".into()])]);
        let bytes = write_workbook(&[("Pre-Survey", &pre), ("Post-Survey", &post)]).unwrap();

        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes)).unwrap();
        assert_eq!(workbook.sheet_names(), vec!["Pre-Survey", "Post-Survey"]);

        let range = workbook.worksheet_range("Pre-Survey").unwrap();
        assert_eq!(range.get_value((0, 0)), Some(&Data::String("RecordID (Value)".into())));
        assert_eq!(range.get_value((1, 0)), Some(&Data::String("0042".into())));
        assert_eq!(range.get_value((1, 2)), Some(&Data::Float(1.0)));
        assert_eq!(range.get_value((2, 3)), Some(&Data::String("N/A".into())));
        assert!(matches!(range.get_value((2, 2)), None | Some(&Data::Empty)));
    }

    #[test]
    fn test_invalid_sheet_name() {
        let table = sample_table();
        assert!(write_workbook(&[("Pre/Survey", &table)]).is_err());
    }

    #[test]
    fn test_save_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("merged.xlsx");
        let table = sample_table();

        save_workbook(&[("Pre-Survey", &table)], &path).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0);
    }
}
