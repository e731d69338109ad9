//! One report run: column config upkeep, projection, rendering and naming.

use crate::columns::{
    apply_column_config, generate_column_config, migrate_config_widths, reconcile_column_config, ColumnConfig,
};
use crate::config::RenderOptions;
use crate::render::generate_excel_with_options;
use crate::template::SheetTemplate;
use crate::types::{QueryResult, Result};
use crate::writer::attachment_filename;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Everything persisted with a report plus the fresh query result.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportJob {
    pub title: String,
    pub query: QueryResult,
    #[serde(default)]
    pub column_config: Option<Vec<ColumnConfig>>,
    #[serde(default)]
    pub formatting: Option<SheetTemplate>,
}

impl ReportJob {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

/// The rendered attachment and the config to persist back onto the report.
#[derive(Debug, Clone)]
pub struct ReportArtifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub warnings: Vec<String>,
    pub row_count: usize,
    pub column_config: Vec<ColumnConfig>,
}

pub fn prepare_report(
    title: &str,
    query: &QueryResult,
    stored_config: Option<&[ColumnConfig]>,
    template: Option<&SheetTemplate>,
    date: NaiveDate,
    options: &RenderOptions,
) -> Result<ReportArtifact> {
    let (column_config, warnings) = match stored_config {
        Some(existing) if !existing.is_empty() => {
            let migrated = migrate_config_widths(existing);
            let reconciled = reconcile_column_config(&migrated, &query.columns);
            (reconciled.config, reconciled.warnings)
        }
        _ => {
            log::debug!("no stored column config; generating one for {} columns", query.num_cols());
            (generate_column_config(&query.columns), Vec::new())
        }
    };

    let mapped = apply_column_config(&column_config, &query.columns, &query.rows);
    let bytes = generate_excel_with_options(
        title,
        &mapped.columns,
        &mapped.rows,
        &mapped.config_ids,
        &column_config,
        template,
        options,
    )?;

    let filename = attachment_filename(title, date);
    log::info!(
        "prepared '{}': {} rows, {} bytes, {} warnings",
        filename,
        mapped.rows.len(),
        bytes.len(),
        warnings.len()
    );

    Ok(ReportArtifact {
        bytes,
        filename,
        warnings,
        row_count: mapped.rows.len(),
        column_config,
    })
}

pub fn prepare_job(job: &ReportJob, date: NaiveDate, options: &RenderOptions) -> Result<ReportArtifact> {
    prepare_report(
        &job.title,
        &job.query,
        job.column_config.as_deref(),
        job.formatting.as_ref(),
        date,
        options,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CellValue, Row};

    fn query(columns: &[&str], rows: usize) -> QueryResult {
        let columns: Vec<String> = columns.iter().map(|s| s.to_string()).collect();
        let rows = (0..rows)
            .map(|i| {
                columns
                    .iter()
                    .map(|c| (c.clone(), CellValue::Number(i as f64)))
                    .collect::<Row>()
            })
            .collect();
        QueryResult { columns, rows }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 31).unwrap()
    }

    #[test]
    fn test_first_run_generates_config() {
        let artifact = prepare_report("Daily KPIs", &query(&["user_id", "total"], 4), None, None, date(), &RenderOptions::default())
            .unwrap();
        assert!(artifact.warnings.is_empty());
        assert_eq!(artifact.row_count, 4);
        assert_eq!(artifact.column_config.len(), 2);
        assert_eq!(artifact.filename, "Daily KPIs_2025-01-31.xlsx");
        assert_eq!(&artifact.bytes[..2], b"PK");
    }

    #[test]
    fn test_later_run_reconciles_and_keeps_missing_columns() {
        let first = prepare_report("r", &query(&["a", "amount"], 1), None, None, date(), &RenderOptions::default()).unwrap();

        let mut stored = first.column_config.clone();
        stored[1].width = 140.0;

        let second = prepare_report("r", &query(&["a", "extra"], 1), Some(&stored), None, date(), &RenderOptions::default())
            .unwrap();
        assert_eq!(second.column_config.len(), 3);
        assert_eq!(second.column_config[0].id, stored[0].id);
        assert_eq!(second.column_config[1].id, stored[1].id);
        assert_eq!(second.column_config[1].width, 20.0);
        assert_eq!(second.warnings.len(), 2);
        assert!(second.warnings[0].contains("amount"));
    }

    #[test]
    fn test_job_json_shape() {
        let json = r#"{
            "title": "Job",
            "query": {"columns": ["x"], "rows": [{"x": 1}, {"x": "two"}]},
            "columnConfig": null
        }"#;
        let job: ReportJob = serde_json::from_str(json).unwrap();
        let artifact = prepare_job(&job, date(), &RenderOptions::default()).unwrap();
        assert_eq!(artifact.row_count, 2);
    }
}
