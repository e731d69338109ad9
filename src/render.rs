//! Compose one worksheet from mapped data, the column config and an optional template.
//!
//! Rows in a [`RenderedSheet`] are 1-based worksheet rows and columns are
//! 0-based. Template rows and columns are the editor's 0-based coordinates.

use crate::columns::ColumnConfig;
use crate::config::RenderOptions;
use crate::formula::{adjust_formula_row, shift_formula_refs, translate_formula};
use crate::mapper::{build_position_map, reverse_position_map, PositionMap};
use crate::styles::{header_style, style_from_data, CellStyle, MergeRange};
use crate::template::{SheetSnapshot, SheetTemplate, StyleData, TemplateCell};
use crate::types::{CellValue, ReportError, Result, Row};
use crate::validation::{
    ranges_overlap, sanitize_sheet_name, validate_cell_coords, validate_dimensions,
    validate_merge_range, validate_rows, validate_sheet_name, MAX_COLS, MAX_COL_WIDTH, MAX_ROWS,
};
use crate::writer;
use std::collections::{BTreeMap, HashMap};

/// Column formulas are written against the first data row of a sheet without preamble.
const COLUMN_FORMULA_ANCHOR_ROW: u32 = 2;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedCell {
    pub value: CellValue,
    /// Formula text as authored, leading `=` included.
    pub formula: Option<String>,
    pub style: Option<CellStyle>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FreezePane {
    pub rows: usize,
    pub cols: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoFilter {
    pub first_row: usize,
    pub last_row: usize,
    pub first_col: usize,
    pub last_col: usize,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderedSheet {
    pub name: String,
    pub cells: BTreeMap<usize, BTreeMap<usize, RenderedCell>>,
    pub column_widths: Vec<f64>,
    pub merges: Vec<MergeRange>,
    pub freeze: Option<FreezePane>,
    pub auto_filter: Option<AutoFilter>,
    pub header_row: usize,
}

impl RenderedSheet {
    pub fn cell(&self, row: usize, col: usize) -> Option<&RenderedCell> {
        self.cells.get(&row).and_then(|r| r.get(&col))
    }

    fn cell_mut(&mut self, row: usize, col: usize) -> &mut RenderedCell {
        self.cells.entry(row).or_default().entry(col).or_default()
    }

    /// Last used row and column, if any cell exists.
    pub fn extent(&self) -> Option<(usize, usize)> {
        let last_row = *self.cells.keys().next_back()?;
        let last_col = self
            .cells
            .values()
            .filter_map(|cols| cols.keys().next_back().copied())
            .max()?
            .max(self.column_widths.len().saturating_sub(1));
        Some((last_row, last_col))
    }
}

/// Render with [`RenderOptions::default`].
pub fn generate_excel(
    title: &str,
    columns: &[String],
    rows: &[Row],
    config_ids: &[String],
    column_config: &[ColumnConfig],
    template: Option<&SheetTemplate>,
) -> Result<Vec<u8>> {
    let options = RenderOptions::default();
    generate_excel_with_options(title, columns, rows, config_ids, column_config, template, &options)
}

pub fn generate_excel_with_options(
    title: &str,
    columns: &[String],
    rows: &[Row],
    config_ids: &[String],
    column_config: &[ColumnConfig],
    template: Option<&SheetTemplate>,
    options: &RenderOptions,
) -> Result<Vec<u8>> {
    let sheet = render_sheet(title, columns, rows, config_ids, column_config, template, options)?;
    writer::write_workbook(&sheet, options)
}

/// Build the sparse cell grid and sheet cosmetics without packaging them.
pub fn render_sheet(
    title: &str,
    columns: &[String],
    rows: &[Row],
    config_ids: &[String],
    column_config: &[ColumnConfig],
    template: Option<&SheetTemplate>,
    options: &RenderOptions,
) -> Result<RenderedSheet> {
    if config_ids.len() != columns.len() {
        return Err(ReportError::Validation(format!(
            "{} column ids supplied for {} columns",
            config_ids.len(),
            columns.len()
        )));
    }
    validate_rows(columns, rows)?;

    let pos_map = build_position_map(template, config_ids)?;
    let start_row = template.map_or(0, |t| t.start_row as usize);
    let header_row = start_row + 1;
    let first_data_row = start_row + 2;
    validate_dimensions(header_row, rows.len(), columns.len())?;

    let snapshot = template.and_then(SheetTemplate::first_sheet);
    let ctx = Context { template, snapshot, options, pos_map: &pos_map };

    let name = sanitize_sheet_name(title);
    validate_sheet_name(&name).map_err(ReportError::Validation)?;

    let mut sheet = RenderedSheet {
        name,
        header_row,
        ..Default::default()
    };

    let configs: HashMap<&str, &ColumnConfig> =
        column_config.iter().map(|c| (c.id.as_str(), c)).collect();
    let current_to_saved = reverse_position_map(&pos_map);

    sheet.column_widths = config_ids
        .iter()
        .enumerate()
        .map(|(col, id)| {
            let saved = current_to_saved.get(&col).copied();
            ctx.column_width(saved, configs.get(id.as_str()).copied())
        })
        .collect();

    ctx.write_preamble(&mut sheet, start_row);

    for (col, name) in columns.iter().enumerate() {
        let template_style = current_to_saved
            .get(&col)
            .and_then(|&saved| ctx.template_cell(start_row, saved))
            .and_then(|cell| ctx.style_data(cell));
        let cell = sheet.cell_mut(header_row, col);
        cell.value = CellValue::String(name.clone());
        cell.style = Some(header_style(template_style, options));
    }

    for (idx, row) in rows.iter().enumerate() {
        let row_num = first_data_row + idx;
        for (col, name) in columns.iter().enumerate() {
            if let Some(value) = row.get(name) {
                if !matches!(value, CellValue::Empty) {
                    sheet.cell_mut(row_num, col).value = value.clone();
                }
            }
        }
    }

    ctx.propagate_data_cosmetics(&mut sheet, start_row, first_data_row, rows.len());
    write_column_formulas(&mut sheet, config_ids, &configs, first_data_row, rows.len());

    sheet.merges = ctx.remap_merges(start_row);
    sheet.freeze = ctx.freeze(start_row);

    if !columns.is_empty() {
        sheet.auto_filter = Some(AutoFilter {
            first_row: header_row,
            last_row: header_row + rows.len(),
            first_col: 0,
            last_col: columns.len() - 1,
        });
    }

    log::debug!(
        "rendered sheet '{}': {} columns, {} data rows, {} merges",
        sheet.name,
        columns.len(),
        rows.len(),
        sheet.merges.len()
    );
    Ok(sheet)
}

/// Column-declared formulas win over anything the template put in the same cell.
fn write_column_formulas(
    sheet: &mut RenderedSheet,
    config_ids: &[String],
    configs: &HashMap<&str, &ColumnConfig>,
    first_data_row: usize,
    num_rows: usize,
) {
    for (col, id) in config_ids.iter().enumerate() {
        let formula = match configs.get(id.as_str()).and_then(|c| c.formula.as_deref()) {
            Some(f) if !f.trim().is_empty() => f,
            _ => continue,
        };
        for idx in 0..num_rows {
            let row_num = first_data_row + idx;
            let cell = sheet.cell_mut(row_num, col);
            let adjusted = adjust_formula_row(formula, COLUMN_FORMULA_ANCHOR_ROW, row_num as u32);
            cell.formula = Some(adjusted);
            cell.value = CellValue::Empty;
        }
    }
}

struct Context<'a> {
    template: Option<&'a SheetTemplate>,
    snapshot: Option<&'a SheetSnapshot>,
    options: &'a RenderOptions,
    pos_map: &'a PositionMap,
}

impl<'a> Context<'a> {
    fn template_cell(&self, row: usize, col: usize) -> Option<&'a TemplateCell> {
        self.snapshot?.cell_data.get(&(row as u32))?.get(&(col as u32))
    }

    fn style_data(&self, cell: &'a TemplateCell) -> Option<&'a StyleData> {
        self.template?.resolve_style(cell.s.as_ref()?)
    }

    fn cell_style(&self, cell: &'a TemplateCell) -> Option<CellStyle> {
        self.style_data(cell).map(|data| style_from_data(data, self.options))
    }

    fn column_width(&self, saved_col: Option<usize>, config: Option<&ColumnConfig>) -> f64 {
        let from_template = saved_col
            .and_then(|saved| self.snapshot?.column_data.get(&(saved as u32)))
            .and_then(|c| c.w)
            .filter(|w| *w > 0.0)
            .map(|px| self.options.pixels_to_width(px));

        let width = from_template
            .or_else(|| config.map(|c| c.width).filter(|w| *w > 0.0))
            .unwrap_or(self.options.default_column_width);
        width.min(MAX_COL_WIDTH)
    }

    /// Caption rows above the header are copied as-is, without column mapping.
    fn write_preamble(&self, sheet: &mut RenderedSheet, start_row: usize) {
        let Some(snapshot) = self.snapshot else {
            return;
        };
        for (&row, cells) in snapshot.cell_data.range(..start_row as u32) {
            for (&col, cell) in cells {
                let coords = validate_cell_coords(row as usize + 1, col as usize, "Preamble cell");
                if let Err(e) = coords {
                    log::warn!("skipping preamble cell: {}", e);
                    continue;
                }
                let style = self.cell_style(cell);
                let value = match cell.f {
                    Some(_) => CellValue::Empty,
                    None => cell.v.clone().unwrap_or_default(),
                };
                if value.is_empty() && style.is_none() && cell.f.is_none() {
                    continue;
                }
                let target = sheet.cell_mut(row as usize + 1, col as usize);
                target.value = value;
                target.formula = cell.f.clone();
                target.style = style;
            }
        }
    }

    /// Spread every template cell below the header onto all data rows of its mapped column.
    fn propagate_data_cosmetics(
        &self,
        sheet: &mut RenderedSheet,
        start_row: usize,
        first_data_row: usize,
        num_rows: usize,
    ) {
        let Some(snapshot) = self.snapshot else {
            return;
        };
        let shared = shared_formula_anchors(snapshot);

        for (&trow, cells) in snapshot.cell_data.range(start_row as u32 + 1..) {
            for (&saved_col, cell) in cells {
                let Some(&current_col) = self.pos_map.get(&(saved_col as usize)) else {
                    continue;
                };
                let style = self.cell_style(cell);
                let formula = cell_formula(cell, trow, saved_col, &shared);
                if style.is_none() && formula.is_none() {
                    continue;
                }

                // Template formulas reference 1-based rows of the captured row.
                let template_row = trow + 1;
                for idx in 0..num_rows {
                    let row_num = first_data_row + idx;
                    let target = sheet.cell_mut(row_num, current_col);
                    if let Some(ref style) = style {
                        target.style = Some(style.clone());
                    }
                    if let Some(ref f) = formula {
                        let translated =
                            translate_formula(f, self.pos_map, template_row, row_num as u32);
                        target.formula = Some(translated);
                        target.value = CellValue::Empty;
                    }
                }
            }
        }
    }

    fn remap_merges(&self, start_row: usize) -> Vec<MergeRange> {
        let Some(snapshot) = self.snapshot else {
            return Vec::new();
        };
        let mut merges: Vec<MergeRange> = Vec::with_capacity(snapshot.merge_data.len());

        for m in &snapshot.merge_data {
            let (start_col, end_col) = if (m.start_row as usize) < start_row {
                (m.start_column as usize, m.end_column as usize)
            } else {
                let start = self.pos_map.get(&(m.start_column as usize));
                let end = self.pos_map.get(&(m.end_column as usize));
                match (start, end) {
                    (Some(&s), Some(&e)) => (s, e),
                    _ => {
                        log::warn!(
                            "dropping merge at row {} columns {}..={}: column no longer present",
                            m.start_row,
                            m.start_column,
                            m.end_column
                        );
                        continue;
                    }
                }
            };

            let merge = MergeRange {
                start_row: m.start_row as usize + 1,
                start_col,
                end_row: m.end_row as usize + 1,
                end_col,
            };
            if let Err(e) = validate_merge_range(&merge) {
                log::warn!("skipping merge: {}", e);
                continue;
            }
            if merges.iter().any(|existing| ranges_overlap(existing, &merge)) {
                log::warn!("skipping merge overlapping an earlier one at row {}", merge.start_row);
                continue;
            }
            merges.push(merge);
        }
        merges
    }

    fn freeze(&self, start_row: usize) -> Option<FreezePane> {
        match self.snapshot.and_then(|s| s.freeze.as_ref()) {
            Some(f) if f.x_split == 0 && f.y_split == 0 => None,
            Some(f) if f.x_split as usize >= MAX_COLS || f.y_split as usize >= MAX_ROWS => {
                log::warn!(
                    "template freeze {}x{} is outside the sheet, using the default",
                    f.y_split,
                    f.x_split
                );
                Some(FreezePane { rows: start_row + 1, cols: 0 })
            }
            Some(f) => Some(FreezePane { rows: f.y_split as usize, cols: f.x_split as usize }),
            None => Some(FreezePane { rows: start_row + 1, cols: 0 }),
        }
    }
}

/// Shared-formula id -> (formula, row, column) of the cell that carries the text.
fn shared_formula_anchors(snapshot: &SheetSnapshot) -> HashMap<&str, (&str, u32, u32)> {
    let mut anchors = HashMap::new();
    for (&row, cells) in &snapshot.cell_data {
        for (&col, cell) in cells {
            if let (Some(si), Some(f)) = (cell.si.as_deref(), cell.f.as_deref()) {
                anchors.entry(si).or_insert((f, row, col));
            }
        }
    }
    anchors
}

fn cell_formula(
    cell: &TemplateCell,
    row: u32,
    col: u32,
    shared: &HashMap<&str, (&str, u32, u32)>,
) -> Option<String> {
    if let Some(ref f) = cell.f {
        return Some(f.clone());
    }
    let si = cell.si.as_deref()?;
    match shared.get(si) {
        Some(&(f, anchor_row, anchor_col)) => Some(shift_formula_refs(
            f,
            row as i64 - anchor_row as i64,
            col as i64 - anchor_col as i64,
        )),
        None => {
            log::warn!("shared formula '{}' has no anchor cell", si);
            None
        }
    }
}
