use crate::config::{Compression, RenderOptions};
use crate::render::RenderedSheet;
use crate::styles::{generate_styles_xml_enhanced, StyleRegistry};
use crate::types::{ReportError, Result};
use crate::xml;
use chrono::NaiveDate;
use mtzip::ZipArchive;
use std::io::Cursor;

/// Package one rendered sheet as an in-memory .xlsx.
///
/// Nothing is returned unless the whole archive was written.
pub fn write_workbook(sheet: &RenderedSheet, options: &RenderOptions) -> Result<Vec<u8>> {
    let sheet_names = vec![sheet.name.as_str()];

    // Cell styles are registered while the sheet is serialized, so styles.xml comes after.
    let mut registry = StyleRegistry::new(&options.font_name);
    let sheet_xml = xml::generate_sheet_xml(sheet, &mut registry);
    log::debug!(
        "sheet '{}' serialized: {} bytes, {} cell formats",
        sheet.name,
        sheet_xml.len(),
        registry.xf_count()
    );

    let mut zipper = ZipArchive::new();
    add_static_files(&mut zipper, &sheet_names, &registry, options.compression);

    zipper
        .add_file_from_memory(sheet_xml, "xl/worksheets/sheet1.xml".to_string())
        .compression_level(options.compression.level())
        .done();

    let bytes = write_zip_to_memory(zipper)?;
    log::debug!("workbook packaged: {} bytes", bytes.len());
    Ok(bytes)
}

/// `"<title keeping [A-Za-z0-9-_ ]>_<YYYY-MM-DD>.xlsx"`
pub fn attachment_filename(title: &str, date: NaiveDate) -> String {
    let stem: String = title
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ' '))
        .collect();
    format!("{}_{}.xlsx", stem, date.format("%Y-%m-%d"))
}

// ============================================================================
// Helper functions
// ============================================================================

fn add_static_files(
    zipper: &mut ZipArchive,
    sheet_names: &[&str],
    style_registry: &StyleRegistry,
    compression: Compression,
) {
    zipper
        .add_file_from_memory(
            xml::generate_content_types(sheet_names).into_bytes(),
            "[Content_Types].xml".to_string(),
        )
        .compression_level(compression.level())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_rels().as_bytes().to_vec(),
            "_rels/.rels".to_string(),
        )
        .compression_level(compression.level())
        .done();

    // Add document properties
    zipper
        .add_file_from_memory(
            xml::generate_core_xml(sheet_names.first().copied().unwrap_or_default()).into_bytes(),
            "docProps/core.xml".to_string(),
        )
        .compression_level(compression.level())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_app_xml(sheet_names).into_bytes(),
            "docProps/app.xml".to_string(),
        )
        .compression_level(compression.level())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_workbook(sheet_names).into_bytes(),
            "xl/workbook.xml".to_string(),
        )
        .compression_level(compression.level())
        .done();

    zipper
        .add_file_from_memory(
            xml::generate_workbook_rels(sheet_names.len()).into_bytes(),
            "xl/_rels/workbook.xml.rels".to_string(),
        )
        .compression_level(compression.level())
        .done();

    zipper
        .add_file_from_memory(
            generate_styles_xml_enhanced(style_registry).into_bytes(),
            "xl/styles.xml".to_string(),
        )
        .compression_level(compression.level())
        .done();
}

fn write_zip_to_memory(mut zipper: ZipArchive) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    zipper
        .write(&mut cursor)
        .map_err(|e| ReportError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
