use crate::render::{RenderedCell, RenderedSheet};
use crate::styles::{NumberFormat, StyleRegistry, DATETIME_XF};
use crate::types::CellValue;
use crate::validation::MAX_COLS;
use chrono::Timelike;

// CT_Worksheet child order used below:
// sheetPr, dimension, sheetViews, sheetFormatPr, cols, sheetData, ..., autoFilter, ..., mergeCells

fn escape_str(value: &str) -> String {
    let mut buf = Vec::with_capacity(value.len());
    xml_escape_simd(value.as_bytes(), &mut buf);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn generate_app_xml(sheet_names: &[&str]) -> String {
    let titles: String = sheet_names
        .iter()
        .map(|n| format!("<vt:lpstr>{}</vt:lpstr>", escape_str(n)))
        .collect();
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Properties xmlns=\"http://schemas.openxmlformats.org/officeDocument/2006/extended-properties\" \
xmlns:vt=\"http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes\">\
<Application>reportxl</Application>\
<HeadingPairs><vt:vector size=\"2\" baseType=\"variant\">\
<vt:variant><vt:lpstr>Worksheets</vt:lpstr></vt:variant><vt:variant><vt:i4>{count}</vt:i4></vt:variant>\
</vt:vector></HeadingPairs>\
<TitlesOfParts><vt:vector size=\"{count}\" baseType=\"lpstr\">{titles}</vt:vector></TitlesOfParts>\
</Properties>",
        count = sheet_names.len(),
        titles = titles,
    )
}

/// Fixed timestamps keep output byte-stable for identical input.
pub fn generate_core_xml(title: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<cp:coreProperties xmlns:cp=\"http://schemas.openxmlformats.org/package/2006/metadata/core-properties\" \
xmlns:dc=\"http://purl.org/dc/elements/1.1/\" \
xmlns:dcterms=\"http://purl.org/dc/terms/\" \
xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\
<dc:title>{}</dc:title>\
<dc:creator>reportxl</dc:creator>\
<cp:lastModifiedBy>reportxl</cp:lastModifiedBy>\
<dcterms:created xsi:type=\"dcterms:W3CDTF\">2020-01-01T00:00:00Z</dcterms:created>\
<dcterms:modified xsi:type=\"dcterms:W3CDTF\">2020-01-01T00:00:00Z</dcterms:modified>\
</cp:coreProperties>",
        escape_str(title)
    )
}

/// Zero-allocation column letter writing - returns length written.
///
/// Columns past XFD are clamped to XFD; callers validate coordinates first.
#[inline(always)]
pub fn write_col_letter(col: usize, buf: &mut [u8; 4]) -> usize {
    let col = col.min(MAX_COLS - 1);
    if col < 26 {
        buf[0] = b'A' + col as u8;
        return 1;
    }

    let mut col = col;
    let mut len = 0;
    let mut stack = [0u8; 4];
    let mut stack_len = 0;

    while col >= 26 {
        stack[stack_len] = b'A' + (col % 26) as u8;
        stack_len += 1;
        col = col / 26 - 1;
    }
    stack[stack_len] = b'A' + col as u8;
    stack_len += 1;

    for i in 0..stack_len {
        buf[i] = stack[stack_len - 1 - i];
        len += 1;
    }

    len
}

/// Write cell reference (e.g. "A1", "B2") to buffer
#[inline(always)]
fn write_cell_ref(col: usize, row: usize, buf: &mut Vec<u8>) {
    let mut col_buf = [0u8; 4];
    let col_len = write_col_letter(col, &mut col_buf);
    buf.extend_from_slice(&col_buf[..col_len]);
    buf.extend_from_slice(itoa::Buffer::new().format(row).as_bytes());
}

#[inline(always)]
fn datetime_to_excel_serial(dt: &chrono::NaiveDateTime) -> f64 {
    let Some(excel_epoch) = chrono::NaiveDate::from_ymd_opt(1899, 12, 30) else {
        return 0.0;
    };
    let days = (dt.date() - excel_epoch).num_days() as f64;
    let time_fraction = (dt.hour() * 3600 + dt.minute() * 60 + dt.second()) as f64 / 86400.0;
    days + time_fraction
}

/// SIMD-accelerated XML escaping
#[inline(always)]
pub fn xml_escape_simd(input: &[u8], output: &mut Vec<u8>) {
    let needs_escape = memchr::memchr3(b'&', b'<', b'>', input).is_some()
        || memchr::memchr2(b'"', b'\'', input).is_some();

    if !needs_escape {
        output.extend_from_slice(input);
        return;
    }

    let mut last = 0;
    let mut pos = 0;

    while pos < input.len() {
        let byte = input[pos];
        let escape: &[u8] = match byte {
            b'&' => b"&amp;",
            b'<' => b"&lt;",
            b'>' => b"&gt;",
            b'"' => b"&quot;",
            b'\'' => b"&apos;",
            _ => {
                pos += 1;
                continue;
            }
        };

        output.extend_from_slice(&input[last..pos]);
        output.extend_from_slice(escape);
        pos += 1;
        last = pos;
    }

    if last < input.len() {
        output.extend_from_slice(&input[last..]);
    }
}

pub fn generate_content_types(sheet_names: &[&str]) -> String {
    let mut xml = String::with_capacity(800 + sheet_names.len() * 150);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/xl/workbook.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml\"/>\
<Override PartName=\"/xl/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.styles+xml\"/>\
<Override PartName=\"/docProps/core.xml\" ContentType=\"application/vnd.openxmlformats-package.core-properties+xml\"/>\
<Override PartName=\"/docProps/app.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.extended-properties+xml\"/>",
    );

    for i in 1..=sheet_names.len() {
        xml.push_str("<Override PartName=\"/xl/worksheets/sheet");
        xml.push_str(&i.to_string());
        xml.push_str(".xml\" ContentType=\"application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml\"/>");
    }

    xml.push_str("</Types>");
    xml
}

pub fn generate_rels() -> &'static str {
    "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"xl/workbook.xml\"/>\
<Relationship Id=\"rId2\" Type=\"http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties\" Target=\"docProps/core.xml\"/>\
<Relationship Id=\"rId3\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties\" Target=\"docProps/app.xml\"/>\
</Relationships>"
}

/// Formulas are never evaluated here, so the workbook asks for a full recalculation on open.
pub fn generate_workbook(sheet_names: &[&str]) -> String {
    let mut xml = String::with_capacity(500 + sheet_names.len() * 80);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<workbook xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" \
xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">\
<bookViews><workbookView activeTab=\"0\"/></bookViews>\
<sheets>",
    );

    for (id, name) in (1..).zip(sheet_names) {
        xml.push_str(&format!("<sheet name=\"{}\" sheetId=\"{id}\" r:id=\"rId{id}\"/>", escape_str(name)));
    }

    xml.push_str("</sheets><calcPr calcId=\"191029\" fullCalcOnLoad=\"1\"/></workbook>");
    xml
}

pub fn generate_workbook_rels(num_sheets: usize) -> String {
    let mut xml = String::with_capacity(300 + num_sheets * 150);
    xml.push_str(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId100\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>",
    );

    for i in 1..=num_sheets {
        xml.push_str("<Relationship Id=\"rId");
        xml.push_str(&i.to_string());
        xml.push_str("\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" Target=\"worksheets/sheet");
        xml.push_str(&i.to_string());
        xml.push_str(".xml\"/>");
    }

    xml.push_str("</Relationships>");
    xml
}

/// Serialize a rendered sheet, registering each cell style as it is written.
pub fn generate_sheet_xml(sheet: &RenderedSheet, registry: &mut StyleRegistry) -> Vec<u8> {
    let cell_count: usize = sheet.cells.values().map(|r| r.len()).sum();
    let mut buf = Vec::with_capacity(1000 + cell_count * 40);

    buf.extend_from_slice(b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
<worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\" xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\">");

    // 1. DIMENSION
    buf.extend_from_slice(b"<dimension ref=\"");
    match sheet.extent() {
        Some((last_row, last_col)) if last_row > 1 || last_col > 0 => {
            buf.extend_from_slice(b"A1:");
            write_cell_ref(last_col, last_row, &mut buf);
        }
        _ => buf.extend_from_slice(b"A1"),
    }
    buf.extend_from_slice(b"\"/>");

    // 2. SHEETVIEWS
    buf.extend_from_slice(b"<sheetViews><sheetView workbookViewId=\"0\"");
    match sheet.freeze {
        Some(freeze) if freeze.rows > 0 || freeze.cols > 0 => {
            buf.push(b'>');
            buf.extend_from_slice(b"<pane ");

            if freeze.cols > 0 {
                buf.extend_from_slice(b"xSplit=\"");
                buf.extend_from_slice(itoa::Buffer::new().format(freeze.cols).as_bytes());
                buf.extend_from_slice(b"\" ");
            }

            if freeze.rows > 0 {
                buf.extend_from_slice(b"ySplit=\"");
                buf.extend_from_slice(itoa::Buffer::new().format(freeze.rows).as_bytes());
                buf.extend_from_slice(b"\" ");
            }

            let active_pane: &[u8] = match (freeze.rows > 0, freeze.cols > 0) {
                (true, true) => b"bottomRight",
                (true, false) => b"bottomLeft",
                _ => b"topRight",
            };

            buf.extend_from_slice(b"topLeftCell=\"");
            write_cell_ref(freeze.cols, freeze.rows + 1, &mut buf);
            buf.extend_from_slice(b"\" activePane=\"");
            buf.extend_from_slice(active_pane);
            buf.extend_from_slice(b"\" state=\"frozen\"/>");
            buf.extend_from_slice(b"<selection pane=\"");
            buf.extend_from_slice(active_pane);
            buf.extend_from_slice(b"\"/>");
            buf.extend_from_slice(b"</sheetView></sheetViews>");
        }
        _ => buf.extend_from_slice(b"/></sheetViews>"),
    }

    // 3. SHEETFORMATPR
    buf.extend_from_slice(b"<sheetFormatPr defaultRowHeight=\"15\"/>");

    // 4. COLS
    if !sheet.column_widths.is_empty() {
        let mut ryu_buf = ryu::Buffer::new();
        buf.extend_from_slice(b"<cols>");
        for (col_idx, width) in sheet.column_widths.iter().enumerate() {
            let col_num = itoa::Buffer::new().format(col_idx + 1).to_owned();
            buf.extend_from_slice(b"<col min=\"");
            buf.extend_from_slice(col_num.as_bytes());
            buf.extend_from_slice(b"\" max=\"");
            buf.extend_from_slice(col_num.as_bytes());
            buf.extend_from_slice(b"\" width=\"");
            buf.extend_from_slice(ryu_buf.format(*width).as_bytes());
            buf.extend_from_slice(b"\" customWidth=\"1\"/>");
        }
        buf.extend_from_slice(b"</cols>");
    }

    // 5. SHEETDATA
    if sheet.cells.is_empty() {
        buf.extend_from_slice(b"<sheetData/>");
    } else {
        buf.extend_from_slice(b"<sheetData>");

        let mut ryu_buf = ryu::Buffer::new();
        let mut int_buf = itoa::Buffer::new();
        let mut cell_ref = Vec::with_capacity(16);

        for (&row_num, cells) in &sheet.cells {
            buf.extend_from_slice(b"<row r=\"");
            buf.extend_from_slice(int_buf.format(row_num).as_bytes());
            buf.extend_from_slice(b"\">");

            for (&col_idx, cell) in cells {
                cell_ref.clear();
                write_cell_ref(col_idx, row_num, &mut cell_ref);
                let style_id = cell_style_id(cell, registry);
                write_cell(cell, &cell_ref, style_id, &mut buf, &mut ryu_buf);
            }

            buf.extend_from_slice(b"</row>");
        }

        buf.extend_from_slice(b"</sheetData>");
    }

    // 6. AUTOFILTER
    if let Some(filter) = sheet.auto_filter {
        buf.extend_from_slice(b"<autoFilter ref=\"");
        write_cell_ref(filter.first_col, filter.first_row, &mut buf);
        buf.push(b':');
        write_cell_ref(filter.last_col, filter.last_row, &mut buf);
        buf.extend_from_slice(b"\"/>");
    }

    // 7. MERGE CELLS
    if !sheet.merges.is_empty() {
        buf.extend_from_slice(b"<mergeCells count=\"");
        buf.extend_from_slice(itoa::Buffer::new().format(sheet.merges.len()).as_bytes());
        buf.extend_from_slice(b"\">");

        for merge in &sheet.merges {
            buf.extend_from_slice(b"<mergeCell ref=\"");
            write_cell_ref(merge.start_col, merge.start_row, &mut buf);
            buf.push(b':');
            write_cell_ref(merge.end_col, merge.end_row, &mut buf);
            buf.extend_from_slice(b"\"/>");
        }

        buf.extend_from_slice(b"</mergeCells>");
    }

    buf.extend_from_slice(b"<pageMargins left=\"0.7\" right=\"0.7\" top=\"0.75\" bottom=\"0.75\" header=\"0.3\" footer=\"0.3\"/>");
    buf.extend_from_slice(b"</worksheet>");
    buf
}

/// Dates without an explicit number format get the stock date-time one.
fn cell_style_id(cell: &RenderedCell, registry: &mut StyleRegistry) -> Option<u32> {
    let is_date = matches!(cell.value, CellValue::Date(_)) && cell.formula.is_none();
    let id = match &cell.style {
        Some(style) if is_date && style.number_format.is_none() => {
            let mut dated = style.clone();
            dated.number_format = Some(NumberFormat::DateTime);
            registry.register_cell_style(&dated)
        }
        Some(style) => registry.register_cell_style(style),
        None if is_date => DATETIME_XF,
        None => 0,
    };
    (id > 0).then_some(id)
}

#[inline(always)]
fn write_cell_open(cell_ref: &[u8], style_id: Option<u32>, buf: &mut Vec<u8>) {
    buf.extend_from_slice(b"<c r=\"");
    buf.extend_from_slice(cell_ref);
    if let Some(sid) = style_id {
        buf.extend_from_slice(b"\" s=\"");
        buf.extend_from_slice(itoa::Buffer::new().format(sid).as_bytes());
    }
    buf.push(b'"');
}

fn write_cell(
    cell: &RenderedCell,
    cell_ref: &[u8],
    style_id: Option<u32>,
    buf: &mut Vec<u8>,
    ryu_buf: &mut ryu::Buffer,
) {
    write_cell_open(cell_ref, style_id, buf);

    // Formula takes precedence; the stored text carries no leading '='
    if let Some(ref formula) = cell.formula {
        let text = formula.strip_prefix('=').unwrap_or(formula);
        buf.extend_from_slice(b"><f>");
        xml_escape_simd(text.as_bytes(), buf);
        buf.extend_from_slice(b"</f></c>");
        return;
    }

    match &cell.value {
        CellValue::Empty => buf.extend_from_slice(b"/>"),
        CellValue::String(s) => {
            buf.extend_from_slice(b" t=\"inlineStr\"><is><t xml:space=\"preserve\">");
            xml_escape_simd(s.as_bytes(), buf);
            buf.extend_from_slice(b"</t></is></c>");
        }
        CellValue::Number(n) if !n.is_finite() => {
            buf.extend_from_slice(b" t=\"e\"><v>#NUM!</v></c>");
        }
        CellValue::Number(n) => {
            buf.extend_from_slice(b"><v>");
            if n.fract() == 0.0 && n.abs() < 9007199254740992.0 {
                buf.extend_from_slice(itoa::Buffer::new().format(*n as i64).as_bytes());
            } else {
                buf.extend_from_slice(ryu_buf.format(*n).as_bytes());
            }
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::Bool(b) => {
            buf.extend_from_slice(b" t=\"b\"><v>");
            buf.push(if *b { b'1' } else { b'0' });
            buf.extend_from_slice(b"</v></c>");
        }
        CellValue::Date(dt) => {
            buf.extend_from_slice(b"><v>");
            buf.extend_from_slice(ryu_buf.format(datetime_to_excel_serial(dt)).as_bytes());
            buf.extend_from_slice(b"</v></c>");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{AutoFilter, FreezePane};
    use crate::styles::{CellStyle, FontStyle, MergeRange};
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn text(buf: Vec<u8>) -> String {
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn test_col_letters() {
        let mut buf = [0u8; 4];
        let cases = [(0, "A"), (25, "Z"), (26, "AA"), (701, "ZZ"), (702, "AAA")];
        for (col, expected) in cases {
            let len = write_col_letter(col, &mut buf);
            assert_eq!(&buf[..len], expected.as_bytes());
        }
    }

    #[test]
    fn test_col_letters_clamp_past_last_column() {
        let mut buf = [0u8; 4];
        for col in [16_383, 20_000, 475_254, usize::MAX] {
            let len = write_col_letter(col, &mut buf);
            assert_eq!(&buf[..len], b"XFD");
        }
    }

    #[test]
    fn test_escape() {
        let mut out = Vec::new();
        xml_escape_simd(b"a<b & \"c\"", &mut out);
        assert_eq!(out, b"a&lt;b &amp; &quot;c&quot;");
    }

    #[test]
    fn test_excel_serial() {
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(12, 0, 0).unwrap();
        assert_eq!(datetime_to_excel_serial(&dt), 45306.5);
    }

    #[test]
    fn test_workbook_requests_recalc_and_escapes_names() {
        let xml = generate_workbook(&["P&L"]);
        assert!(xml.contains("<sheet name=\"P&amp;L\""));
        assert!(xml.contains("fullCalcOnLoad=\"1\""));
    }

    #[test]
    fn test_sheet_xml_layout() {
        let mut cells: BTreeMap<usize, BTreeMap<usize, RenderedCell>> = BTreeMap::new();
        let bold = CellStyle {
            font: Some(FontStyle {
                bold: true,
                italic: false,
                underline: false,
                strikethrough: false,
                size: Some(11.0),
                color: None,
                name: Some("Calibri".to_string()),
            }),
            ..Default::default()
        };
        cells.entry(1).or_default().insert(0, RenderedCell {
            value: CellValue::from("Total"),
            formula: None,
            style: Some(bold),
        });
        cells.entry(2).or_default().insert(0, RenderedCell { value: CellValue::Number(3.0), ..Default::default() });
        cells.entry(2).or_default().insert(1, RenderedCell {
            formula: Some("=A2*2".to_string()),
            ..Default::default()
        });
        let dt = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap().and_hms_opt(0, 0, 0).unwrap();
        cells.entry(3).or_default().insert(0, RenderedCell { value: CellValue::Date(dt), ..Default::default() });

        let sheet = RenderedSheet {
            name: "S".to_string(),
            cells,
            column_widths: vec![10.0, 20.5],
            merges: vec![MergeRange { start_row: 3, start_col: 0, end_row: 3, end_col: 1 }],
            freeze: Some(FreezePane { rows: 1, cols: 0 }),
            auto_filter: Some(AutoFilter { first_row: 1, last_row: 3, first_col: 0, last_col: 1 }),
            header_row: 1,
        };

        let mut registry = StyleRegistry::new("Calibri");
        let xml = text(generate_sheet_xml(&sheet, &mut registry));

        assert!(xml.contains("<dimension ref=\"A1:B3\"/>"));
        assert!(xml.contains("<pane ySplit=\"1\" topLeftCell=\"A2\" activePane=\"bottomLeft\" state=\"frozen\"/>"));
        assert!(xml.contains("<col min=\"2\" max=\"2\" width=\"20.5\" customWidth=\"1\"/>"));
        assert!(xml.contains("<c r=\"A1\" s=\"2\" t=\"inlineStr\"><is><t xml:space=\"preserve\">Total</t></is></c>"));
        assert!(xml.contains("<c r=\"A2\"><v>3</v></c>"));
        assert!(xml.contains("<c r=\"B2\"><f>A2*2</f></c>"));
        assert!(xml.contains("<c r=\"A3\" s=\"1\"><v>45306.0</v></c>"));
        assert!(xml.contains("<autoFilter ref=\"A1:B3\"/>"));
        assert!(xml.contains("<mergeCells count=\"1\"><mergeCell ref=\"A3:B3\"/></mergeCells>"));

        let order = ["<dimension", "<sheetViews", "<cols>", "<sheetData>", "<autoFilter", "<mergeCells"];
        let positions: Vec<usize> = order.iter().map(|tag| xml.find(tag).unwrap()).collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_sheet() {
        let sheet = RenderedSheet { name: "Empty".to_string(), ..Default::default() };
        let mut registry = StyleRegistry::new("Calibri");
        let xml = text(generate_sheet_xml(&sheet, &mut registry));
        assert!(xml.contains("<dimension ref=\"A1\"/>"));
        assert!(xml.contains("<sheetData/>"));
        assert!(!xml.contains("<pane"));
    }
}
