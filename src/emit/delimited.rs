//! CSV emission.

use std::path::Path;

use super::{
    filtered_rows, write_failure, EmitSummary, RowFilter, GROUP_HEADER, IMAGE_HEADER,
    RESULT_HEADER,
};
use crate::error::LabelReconError;
use crate::reconcile::ReconcileReport;

pub(super) fn write_csv(
    report: &ReconcileReport,
    path: &Path,
    filter: RowFilter,
) -> Result<EmitSummary, LabelReconError> {
    let mut writer = csv::Writer::from_path(path).map_err(|e| write_failure(path, e))?;

    let columns = report
        .groups
        .first()
        .map(|group| group.columns.as_slice())
        .unwrap_or_default();

    let mut header: Vec<&str> = Vec::with_capacity(columns.len() + 3);
    if report.grouped {
        header.push(GROUP_HEADER);
    }
    header.push(IMAGE_HEADER);
    header.extend(columns.iter().map(String::as_str));
    header.push(RESULT_HEADER);
    writer.write_record(&header).map_err(|e| write_failure(path, e))?;

    let mut rows_written = 0;
    for group in &report.groups {
        for row in filtered_rows(group, filter) {
            let mut record: Vec<&str> = Vec::with_capacity(header.len());
            if report.grouped {
                record.push(group.name.as_deref().unwrap_or_default());
            }
            record.push(row.key.as_str());
            record.extend(row.statuses.iter().map(|status| status.as_str()));
            record.push(row.result_label());

            writer.write_record(&record).map_err(|e| write_failure(path, e))?;
            rows_written += 1;
        }
    }

    writer.flush().map_err(|e| write_failure(path, e))?;

    Ok(EmitSummary {
        path: path.to_path_buf(),
        sheets: 1,
        rows: rows_written,
    })
}
