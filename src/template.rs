//! Persisted cosmetic templates captured from the editing surface.
//!
//! The snapshot mirrors the editor's workbook JSON: a style dictionary, a sparse
//! row -> column -> cell map, column widths, freeze extents and merges.
//! Workbook- and sheet-level fields outside that set are not retained.

use crate::types::CellValue;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Template with positional keys only.
pub const LEGACY_VERSION: u32 = 1;
/// Template with an id -> saved position map.
pub const IDENTITY_MAPPED_VERSION: u32 = 2;

fn legacy_version() -> u32 {
    LEGACY_VERSION
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetTemplate {
    pub snapshot: WorkbookSnapshot,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_map: Option<HashMap<String, usize>>,
    /// Number of preamble rows above the header.
    #[serde(default)]
    pub start_row: u32,
    #[serde(default = "legacy_version")]
    pub version: u32,
}

impl SheetTemplate {
    /// The id map, if this template is identity-mapped.
    pub fn identity_map(&self) -> Option<&HashMap<String, usize>> {
        if self.version >= IDENTITY_MAPPED_VERSION {
            self.column_map.as_ref()
        } else {
            None
        }
    }

    pub fn first_sheet(&self) -> Option<&SheetSnapshot> {
        self.snapshot.first_sheet()
    }

    /// Resolve a cell's style reference against the style dictionary.
    pub fn resolve_style<'a>(&'a self, style: &'a StyleRef) -> Option<&'a StyleData> {
        match style {
            StyleRef::Named(name) => {
                let found = self.snapshot.styles.get(name).and_then(Option::as_ref);
                if found.is_none() {
                    log::warn!("template references unknown style '{}'", name);
                }
                found
            }
            StyleRef::Inline(data) => Some(data),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkbookSnapshot {
    #[serde(default)]
    pub styles: HashMap<String, Option<StyleData>>,
    #[serde(default)]
    pub sheet_order: Vec<String>,
    #[serde(default)]
    pub sheets: BTreeMap<String, SheetSnapshot>,
}

impl WorkbookSnapshot {
    /// The sheet listed first in `sheet_order`, else the first by id.
    pub fn first_sheet(&self) -> Option<&SheetSnapshot> {
        self.sheet_order
            .first()
            .and_then(|id| self.sheets.get(id))
            .or_else(|| self.sheets.values().next())
    }
}

/// Sparse cosmetic state of one sheet. Rows and columns are zero-based.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetSnapshot {
    #[serde(default)]
    pub cell_data: BTreeMap<u32, BTreeMap<u32, TemplateCell>>,
    #[serde(default)]
    pub column_data: BTreeMap<u32, ColumnData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freeze: Option<Freeze>,
    #[serde(default)]
    pub merge_data: Vec<MergeData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TemplateCell {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v: Option<CellValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub s: Option<StyleRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub f: Option<String>,
    /// Shared-formula id; marks the cell as formula-bearing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub si: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TemplateCell {
    pub fn is_formula(&self) -> bool {
        self.f.is_some() || self.si.is_some()
    }
}

/// A cell's style: a key into the style dictionary or an inline definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StyleRef {
    Named(String),
    Inline(StyleData),
}

/// Editor style record. Short keys follow the editor's wire format.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StyleData {
    /// Font family.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ff: Option<String>,
    /// Font size in points.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fs: Option<f64>,
    /// Italic (1 = on).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub it: Option<u8>,
    /// Bold (1 = on).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bl: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ul: Option<TextDecoration>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub st: Option<TextDecoration>,
    /// Font color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cl: Option<ColorData>,
    /// Background color.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bg: Option<ColorData>,
    /// Horizontal alignment: 1 left, 2 center, 3 right, 4 justify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ht: Option<u8>,
    /// Vertical alignment: 1 top, 2 middle, 3 bottom.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vt: Option<u8>,
    /// Wrap strategy: 3 = wrap.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tb: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bd: Option<BorderData>,
    /// Number format.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<NumberFormatData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextDecoration {
    #[serde(default)]
    pub s: u8,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColorData {
    #[serde(default)]
    pub rgb: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BorderData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t: Option<BorderSideData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub b: Option<BorderSideData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub l: Option<BorderSideData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub r: Option<BorderSideData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct BorderSideData {
    /// Line style code.
    #[serde(default)]
    pub s: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cl: Option<ColorData>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NumberFormatData {
    #[serde(default)]
    pub pattern: String,
}

/// Column width in editor pixels.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub w: Option<f64>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Freeze {
    #[serde(default)]
    pub x_split: u32,
    #[serde(default)]
    pub y_split: u32,
    #[serde(default)]
    pub start_row: i64,
    #[serde(default)]
    pub start_column: i64,
}

/// Inclusive merge rectangle, zero-based.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeData {
    pub start_row: u32,
    pub start_column: u32,
    pub end_row: u32,
    pub end_column: u32,
}

/// The one operation the core needs from a live editing session.
pub trait TemplateSource {
    /// Current template, or `None` when no session is active.
    fn extract_template(&self) -> Option<SheetTemplate>;
}

/// Turn a live workbook snapshot into a persistable template.
///
/// Values at rows >= `start_row` are stripped unless the cell carries a
/// formula; preamble rows keep their literal captions.
pub fn capture_template(mut snapshot: WorkbookSnapshot, config_ids: &[String], start_row: u32) -> SheetTemplate {
    for sheet in snapshot.sheets.values_mut() {
        for (_, cells) in sheet.cell_data.range_mut(start_row..) {
            for cell in cells.values_mut() {
                if !cell.is_formula() {
                    cell.v = None;
                }
            }
        }
    }

    let column_map = config_ids
        .iter()
        .enumerate()
        .map(|(pos, id)| (id.clone(), pos))
        .collect();

    SheetTemplate {
        snapshot,
        column_map: Some(column_map),
        start_row,
        version: IDENTITY_MAPPED_VERSION,
    }
}

/// Prefer the live session's template; fall back to the last persisted one.
pub fn resolve_template(
    session: Option<&dyn TemplateSource>,
    persisted: Option<&SheetTemplate>,
) -> Option<SheetTemplate> {
    session
        .and_then(|s| s.extract_template())
        .or_else(|| persisted.cloned())
}
