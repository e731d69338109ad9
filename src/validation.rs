/// Structural checks and Excel limits for rendered reports
use crate::styles::MergeRange;
use crate::types::{ReportError, Result, Row};
use std::collections::HashSet;

// Excel hard limits
pub const MAX_ROWS: usize = 1_048_576;
pub const MAX_COLS: usize = 16_384;
pub const MAX_COL_WIDTH: f64 = 255.0;
const MAX_SHEET_NAME_LEN: usize = 31;
const INVALID_SHEET_CHARS: &str = "[]:*?/\\";
const FALLBACK_SHEET_NAME: &str = "Report";

/// Validate sheet name meets Excel requirements
pub fn validate_sheet_name(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Sheet name cannot be empty".to_string());
    }

    if name.chars().count() > MAX_SHEET_NAME_LEN {
        return Err(format!(
            "Sheet name '{}' exceeds {} characters (has {})",
            name,
            MAX_SHEET_NAME_LEN,
            name.chars().count()
        ));
    }

    for c in INVALID_SHEET_CHARS.chars() {
        if name.contains(c) {
            return Err(format!(
                "Sheet name '{}' contains invalid character '{}'",
                name, c
            ));
        }
    }

    // Check for control characters
    if name.chars().any(|c| c.is_control()) {
        return Err(format!("Sheet name '{}' contains control characters", name));
    }

    Ok(())
}

/// Turn a report title into a name `validate_sheet_name` accepts
pub fn sanitize_sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !INVALID_SHEET_CHARS.contains(*c) && !c.is_control())
        .take(MAX_SHEET_NAME_LEN)
        .collect();

    // Leading/trailing apostrophes are rejected by Excel
    let trimmed = cleaned.trim().trim_matches('\'').trim();
    if trimmed.is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Validate cell coordinates are within Excel limits
pub fn validate_cell_coords(row: usize, col: usize, context: &str) -> std::result::Result<(), String> {
    if row == 0 || row > MAX_ROWS {
        return Err(format!(
            "{}: Row {} is out of range (must be 1-{})",
            context, row, MAX_ROWS
        ));
    }

    if col >= MAX_COLS {
        return Err(format!(
            "{}: Column {} is out of range (must be 0-{})",
            context, col, MAX_COLS - 1
        ));
    }

    Ok(())
}

/// Validate merge cell range
pub fn validate_merge_range(merge: &MergeRange) -> std::result::Result<(), String> {
    if merge.start_row > merge.end_row {
        return Err(format!(
            "Merge cell: start_row {} > end_row {}",
            merge.start_row, merge.end_row
        ));
    }

    if merge.start_col > merge.end_col {
        return Err(format!(
            "Merge cell: start_col {} > end_col {}",
            merge.start_col, merge.end_col
        ));
    }

    if merge.start_row == merge.end_row && merge.start_col == merge.end_col {
        return Err("Merge cell: range covers a single cell".to_string());
    }

    validate_cell_coords(merge.start_row, merge.start_col, "Merge cell start")?;
    validate_cell_coords(merge.end_row, merge.end_col, "Merge cell end")?;

    Ok(())
}

pub fn ranges_overlap(m1: &MergeRange, m2: &MergeRange) -> bool {
    !(m1.end_row < m2.start_row
      || m1.start_row > m2.end_row
      || m1.end_col < m2.start_col
      || m1.start_col > m2.end_col)
}

/// Reject output that cannot fit on one worksheet
pub fn validate_dimensions(header_row: usize, num_rows: usize, num_cols: usize) -> Result<()> {
    if num_cols > MAX_COLS {
        return Err(ReportError::Validation(format!(
            "{} columns exceed the worksheet limit of {}",
            num_cols, MAX_COLS
        )));
    }

    let last_row = header_row + num_rows;
    if last_row > MAX_ROWS {
        return Err(ReportError::Validation(format!(
            "last row {} exceeds the worksheet limit of {}",
            last_row, MAX_ROWS
        )));
    }

    Ok(())
}

/// Every key of every row must name a header column
pub fn validate_rows(columns: &[String], rows: &[Row]) -> Result<()> {
    let header: HashSet<&str> = columns.iter().map(String::as_str).collect();

    for (idx, row) in rows.iter().enumerate() {
        let mut unknown: Vec<&str> = row
            .keys()
            .map(String::as_str)
            .filter(|k| !header.contains(k))
            .collect();
        if !unknown.is_empty() {
            unknown.sort_unstable();
            return Err(ReportError::UnknownColumn {
                row: idx,
                column: unknown[0].to_string(),
            });
        }
    }

    Ok(())
}
