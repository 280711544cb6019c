//! XLSX emission via `rust_xlsxwriter`.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, FormatBorder, Workbook, Worksheet, XlsxError};

use super::{
    filtered_rows, sheet_names, write_failure, EmitSummary, RowFilter, IMAGE_HEADER,
    RESULT_HEADER,
};
use crate::error::LabelReconError;
use crate::reconcile::{GroupTable, ReconcileReport};

// Light red fill used by Excel's built-in "bad" cell style.
const CONFLICT_FILL: u32 = 0xFFC7CE;

struct SheetFormats {
    header: Format,
    conflict: Format,
}

pub(super) fn write_xlsx(
    report: &ReconcileReport,
    path: &Path,
    filter: RowFilter,
) -> Result<EmitSummary, LabelReconError> {
    let formats = SheetFormats {
        header: Format::new()
            .set_bold()
            .set_border_bottom(FormatBorder::Thin),
        conflict: Format::new().set_background_color(Color::RGB(CONFLICT_FILL)),
    };

    let mut workbook = Workbook::new();
    let mut rows_written = 0;

    for (group, name) in report.groups.iter().zip(sheet_names(report)) {
        let worksheet = workbook.add_worksheet();
        worksheet
            .set_name(&name)
            .map_err(|e| write_failure(path, format!("failed to create sheet '{}': {}", name, e)))?;

        rows_written += write_group(worksheet, group, filter, &formats)
            .map_err(|e| write_failure(path, format!("failed to fill sheet '{}': {}", name, e)))?;
    }

    workbook.save(path).map_err(|e| write_failure(path, e))?;

    Ok(EmitSummary {
        path: path.to_path_buf(),
        sheets: report.groups.len(),
        rows: rows_written,
    })
}

fn write_group(
    worksheet: &mut Worksheet,
    group: &GroupTable,
    filter: RowFilter,
    formats: &SheetFormats,
) -> Result<usize, XlsxError> {
    let result_col = col(group.columns.len() + 1);

    worksheet.write_string_with_format(0, 0, IMAGE_HEADER, &formats.header)?;
    for (idx, column) in group.columns.iter().enumerate() {
        worksheet.write_string_with_format(0, col(idx + 1), column, &formats.header)?;
    }
    worksheet.write_string_with_format(0, result_col, RESULT_HEADER, &formats.header)?;

    let mut written = 0;
    for row in filtered_rows(group, filter) {
        written += 1;
        let excel_row = u32::try_from(written).unwrap_or(u32::MAX);

        worksheet.write_string(excel_row, 0, row.key.as_str())?;
        for (idx, status) in row.statuses.iter().enumerate() {
            worksheet.write_string(excel_row, col(idx + 1), status.as_str())?;
        }
        if row.conflict {
            worksheet.write_string_with_format(
                excel_row,
                result_col,
                row.result_label(),
                &formats.conflict,
            )?;
        } else {
            worksheet.write_string(excel_row, result_col, row.result_label())?;
        }
    }

    worksheet.set_freeze_panes(1, 0)?;
    worksheet.autofilter(0, 0, u32::try_from(written).unwrap_or(u32::MAX), result_col)?;
    worksheet.autofit();

    Ok(written)
}

// Out-of-range values are left for rust_xlsxwriter to reject.
fn col(idx: usize) -> u16 {
    u16::try_from(idx).unwrap_or(u16::MAX)
}
