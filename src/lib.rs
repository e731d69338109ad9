//! reportxl - render tabular query results into .xlsx reports that keep their look
//! across runs.
//!
//! A report is rendered from three things:
//! - the fresh query result (column names plus rows)
//! - a persisted column config that gives every output column a stable id
//! - an optional formatting template captured from an earlier rendering
//!
//! Columns in the query may be renamed, added, dropped or reordered between runs.
//! The template is keyed by column id, so styles, widths, formulas, merges and
//! frozen panes follow each column to wherever it lands now.
//!
//! # Example
//!
//! ```no_run
//! use chrono::NaiveDate;
//! use reportxl::{prepare_report, QueryResult, RenderOptions};
//!
//! let query: QueryResult = serde_json::from_str(r#"{"columns":["id","total"],"rows":[{"id":1,"total":9.5}]}"#)?;
//! let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap_or_default();
//! let artifact = prepare_report("Daily KPIs", &query, None, None, date, &RenderOptions::default())?;
//! std::fs::write(&artifact.filename, &artifact.bytes)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;
pub mod columns;
pub mod config;
pub mod formula;
pub mod mapper;
pub mod pipeline;
pub mod render;
pub mod styles;
pub mod template;
pub mod types;
pub mod validation;
pub mod writer;
pub mod xml;

pub use columns::{
    apply_column_config, create_formula_column, generate_column_config, migrate_config_widths,
    reconcile_column_config, ColumnConfig, MappedData, Reconciliation,
};
pub use config::{Compression, RenderOptions};
pub use formula::{adjust_formula_row, remap_formula_columns, translate_formula};
pub use mapper::{build_position_map, PositionMap};
pub use pipeline::{prepare_job, prepare_report, ReportArtifact, ReportJob};
pub use render::{generate_excel, generate_excel_with_options, render_sheet, RenderedSheet};
pub use styles::argb_from_rgb;
pub use template::{capture_template, resolve_template, SheetTemplate, TemplateSource};
pub use types::{CellValue, QueryResult, ReportError, Result, Row};
