//! Column registry: stable identities for output columns.
//!
//! Every output column carries an opaque id that is generated once and never
//! reused. Templates are keyed by these ids, so formatting follows a column
//! through renames, reorders and additions instead of sticking to a slot.

use crate::types::{CellValue, Row};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Excel's default column width in character units.
pub const DEFAULT_COLUMN_WIDTH: f64 = 8.43;

/// Approximate pixels per Excel character-width unit.
pub const PX_PER_EXCEL_WIDTH: f64 = 7.0;

/// Widths above this are assumed to be stored in legacy pixels.
pub const LEGACY_PIXEL_WIDTH_THRESHOLD: f64 = 50.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnConfig {
    pub id: String,
    /// Column in the raw query result; `None` for formula-only columns.
    pub source_column: Option<String>,
    pub display_name: String,
    pub visible: bool,
    /// When set, source data is ignored and the formula is written instead.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
    pub width: f64,
}

impl ColumnConfig {
    fn for_source(source: &str, position: usize) -> Self {
        Self {
            id: generate_id(),
            source_column: Some(source.to_string()),
            display_name: display_name_for(source, position),
            visible: true,
            formula: None,
            width: DEFAULT_COLUMN_WIDTH,
        }
    }
}

/// Result of aligning a saved config with a fresh query.
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciliation {
    pub config: Vec<ColumnConfig>,
    pub warnings: Vec<String>,
}

/// Query data projected through a column config.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MappedData {
    /// Display names of the visible columns, in order.
    pub columns: Vec<String>,
    /// Rows keyed by display name.
    pub rows: Vec<Row>,
    /// Ids of the visible columns, parallel to `columns`.
    pub config_ids: Vec<String>,
}

/// 128 random bits from the thread-local generator, hex encoded.
pub fn generate_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill(&mut bytes);

    let mut id = String::with_capacity(32);
    for b in bytes {
        id.push_str(&format!("{:02x}", b));
    }
    id
}

/// "employee_id" -> "Employee Id", "firstName" -> "First Name".
pub fn prettify_column_name(name: &str) -> String {
    let mut spaced = String::with_capacity(name.len() + 4);
    let mut prev: Option<char> = None;
    let mut in_separator = false;

    for c in name.chars() {
        if c == '_' || c == '-' {
            if !in_separator {
                spaced.push(' ');
                in_separator = true;
            }
            prev = Some(' ');
            continue;
        }
        in_separator = false;
        if matches!(prev, Some(p) if p.is_ascii_lowercase()) && c.is_ascii_uppercase() {
            spaced.push(' ');
        }
        spaced.push(c);
        prev = Some(c);
    }

    let mut pretty = String::with_capacity(spaced.len());
    let mut prev_word = false;
    for c in spaced.chars() {
        let word = c.is_ascii_alphanumeric();
        if word && !prev_word {
            pretty.push(c.to_ascii_uppercase());
        } else {
            pretty.push(c);
        }
        prev_word = word;
    }

    pretty.trim().to_string()
}

fn display_name_for(source: &str, position: usize) -> String {
    let pretty = prettify_column_name(source);
    if !pretty.is_empty() {
        pretty
    } else if !source.trim().is_empty() {
        source.trim().to_string()
    } else {
        format!("Column {}", position + 1)
    }
}

/// Fresh config for a first run: one visible entry per query column.
pub fn generate_column_config(columns: &[String]) -> Vec<ColumnConfig> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, col)| ColumnConfig::for_source(col, idx))
        .collect()
}

/// Align an existing config with the columns of a new query run.
///
/// Entries are never dropped or reordered. Entries whose source vanished are
/// kept and flagged; query columns nobody references are appended.
pub fn reconcile_column_config(existing: &[ColumnConfig], new_columns: &[String]) -> Reconciliation {
    let available: HashSet<&str> = new_columns.iter().map(String::as_str).collect();
    let mut used: HashSet<&str> = HashSet::new();
    let mut warnings = Vec::new();

    let mut config: Vec<ColumnConfig> = existing
        .iter()
        .map(|entry| {
            if let Some(source) = entry.source_column.as_deref() {
                if !available.contains(source) && entry.formula.is_none() {
                    warnings.push(format!(
                        "Column \"{}\" (source: {}) is no longer in the query results",
                        entry.display_name, source
                    ));
                }
                used.insert(source);
            }
            entry.clone()
        })
        .collect();

    for col in new_columns {
        if used.insert(col.as_str()) {
            config.push(ColumnConfig::for_source(col, config.len()));
            warnings.push(format!("New column \"{}\" added to config", col));
        }
    }

    for warning in &warnings {
        log::info!("{}", warning);
    }

    Reconciliation { config, warnings }
}

/// Project raw query rows through the visible entries of `config`.
pub fn apply_column_config(config: &[ColumnConfig], raw_columns: &[String], raw_rows: &[Row]) -> MappedData {
    let visible: Vec<&ColumnConfig> = config.iter().filter(|c| c.visible).collect();
    let present: HashSet<&str> = raw_columns.iter().map(String::as_str).collect();

    let rows = raw_rows
        .iter()
        .map(|raw| {
            visible
                .iter()
                .map(|entry| {
                    let value = match (&entry.formula, entry.source_column.as_deref()) {
                        (None, Some(source)) if present.contains(source) => {
                            raw.get(source).cloned().unwrap_or_default()
                        }
                        // Formula columns are computed by the spreadsheet application
                        _ => CellValue::Empty,
                    };
                    (entry.display_name.clone(), value)
                })
                .collect::<Row>()
        })
        .collect();

    MappedData {
        columns: visible.iter().map(|c| c.display_name.clone()).collect(),
        rows,
        config_ids: visible.iter().map(|c| c.id.clone()).collect(),
    }
}

pub fn create_formula_column(display_name: &str, formula: &str) -> ColumnConfig {
    ColumnConfig {
        id: generate_id(),
        source_column: None,
        display_name: display_name.to_string(),
        visible: true,
        formula: Some(formula.to_string()),
        width: DEFAULT_COLUMN_WIDTH,
    }
}

/// True when the entry's source column is absent from the query.
pub fn is_missing(entry: &ColumnConfig, query_columns: &[String]) -> bool {
    match entry.source_column.as_deref() {
        Some(source) => !query_columns.iter().any(|c| c == source),
        None => false,
    }
}

/// Convert legacy pixel widths to character units.
///
/// Converted values are capped at the threshold so a second pass leaves them alone.
pub fn migrate_config_widths(config: &[ColumnConfig]) -> Vec<ColumnConfig> {
    config
        .iter()
        .map(|c| {
            let mut migrated = c.clone();
            if c.width > LEGACY_PIXEL_WIDTH_THRESHOLD {
                let units = (c.width / PX_PER_EXCEL_WIDTH * 100.0).round() / 100.0;
                migrated.width = units.min(LEGACY_PIXEL_WIDTH_THRESHOLD);
            }
            migrated
        })
        .collect()
}
