mod common;

use common::{names, part_names, read_part, style_of};
use reportxl::template::WorkbookSnapshot;
use reportxl::{
    apply_column_config, capture_template, create_formula_column, generate_column_config, generate_excel,
    reconcile_column_config, CellValue, ReportError, Row,
};

fn row(pairs: &[(&str, CellValue)]) -> Row {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[test]
fn test_package_layout() {
    let columns = names(&["Name"]);
    let rows = vec![row(&[("Name", "Alice".into())])];
    let bytes = generate_excel("Q1/Q2: Sales", &columns, &rows, &names(&["id"]), &[], None).unwrap();

    let parts = part_names(&bytes);
    for expected in [
        "[Content_Types].xml",
        "_rels/.rels",
        "docProps/core.xml",
        "docProps/app.xml",
        "xl/workbook.xml",
        "xl/_rels/workbook.xml.rels",
        "xl/styles.xml",
        "xl/worksheets/sheet1.xml",
    ] {
        assert!(parts.iter().any(|p| p == expected), "missing part {}", expected);
    }

    let workbook = read_part(&bytes, "xl/workbook.xml");
    assert!(workbook.contains("<sheet name=\"Q1Q2 Sales\""));
    assert!(workbook.contains("fullCalcOnLoad=\"1\""));
}

#[test]
fn test_cosmetics_follow_columns_across_reorder() {
    // First run: region, revenue. The user styles the revenue column and widens it.
    let first_columns = names(&["region", "revenue"]);
    let mut config = generate_column_config(&first_columns);
    let first_ids: Vec<String> = config.iter().map(|c| c.id.clone()).collect();

    let snapshot: WorkbookSnapshot = serde_json::from_str(
        r##"{
            "styles": {
                "hdr": {"bg": {"rgb": "#00ff00"}},
                "money": {"bl": 1, "cl": {"rgb": "#ff0000"}}
            },
            "sheetOrder": ["s1"],
            "sheets": {"s1": {
                "cellData": {
                    "0": {"1": {"v": "Revenue", "s": "hdr"}},
                    "1": {"1": {"v": 1.5, "s": "money"}}
                },
                "columnData": {"1": {"w": 140}}
            }}
        }"##,
    )
    .unwrap();
    let template = capture_template(snapshot, &first_ids, 0);

    // Second run: a new column appears and the user moves revenue to the front.
    let query_columns = names(&["region", "revenue", "units"]);
    let reconciled = reconcile_column_config(&config, &query_columns);
    assert_eq!(reconciled.warnings, vec!["New column \"units\" added to config".to_string()]);
    config = reconciled.config;
    config.swap(0, 1);

    let raw_rows = vec![row(&[
        ("region", "North".into()),
        ("revenue", 1200.5.into()),
        ("units", 3.0.into()),
    ])];
    let mapped = apply_column_config(&config, &query_columns, &raw_rows);
    assert_eq!(mapped.columns, names(&["Revenue", "Region", "Units"]));

    let bytes = generate_excel(
        "Sales",
        &mapped.columns,
        &mapped.rows,
        &mapped.config_ids,
        &config,
        Some(&template),
    )
    .unwrap();
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");
    let styles = read_part(&bytes, "xl/styles.xml");

    assert!(sheet.contains("<t xml:space=\"preserve\">Revenue</t>"));
    let revenue_header = style_of(&sheet, "A1").unwrap();
    let region_header = style_of(&sheet, "B1").unwrap();
    assert_ne!(revenue_header, region_header);
    assert_eq!(style_of(&sheet, "C1"), Some(region_header));

    assert!(style_of(&sheet, "A2").is_some());
    assert_eq!(style_of(&sheet, "B2"), None);
    assert!(sheet.contains("<v>1200.5</v>"));
    assert!(sheet.contains("<c r=\"C2\"><v>3</v></c>"));

    assert!(sheet.contains("<col min=\"1\" max=\"1\" width=\"20.0\" customWidth=\"1\"/>"));
    assert!(sheet.contains("<col min=\"2\" max=\"2\" width=\"8.43\" customWidth=\"1\"/>"));

    assert!(styles.contains("<fgColor rgb=\"FF00FF00\"/>"));
    assert!(styles.contains("<fgColor rgb=\"FFD9E1F2\"/>"));
    assert!(styles.contains("<color rgb=\"FFFF0000\"/>"));
}

#[test]
fn test_formula_column_is_written_per_row() {
    let query_columns = names(&["qty", "price"]);
    let mut config = generate_column_config(&query_columns);
    config.push(create_formula_column("Total", "=A2*B2"));

    let raw_rows = vec![
        row(&[("qty", 2.0.into()), ("price", 4.5.into())]),
        row(&[("qty", 1.0.into()), ("price", 10.0.into())]),
    ];
    let mapped = apply_column_config(&config, &query_columns, &raw_rows);
    let bytes = generate_excel("Orders", &mapped.columns, &mapped.rows, &mapped.config_ids, &config, None).unwrap();
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

    assert!(sheet.contains("<c r=\"C2\"><f>A2*B2</f></c>"));
    assert!(sheet.contains("<c r=\"C3\"><f>A3*B3</f></c>"));
    assert!(sheet.contains("<autoFilter ref=\"A1:C3\"/>"));
}

#[test]
fn test_preamble_rows_push_the_table_down() {
    let snapshot: WorkbookSnapshot = serde_json::from_str(
        r#"{
            "sheets": {"s1": {
                "cellData": {"0": {"0": {"v": "Quarterly Report"}}},
                "mergeData": [{"startRow": 0, "startColumn": 0, "endRow": 0, "endColumn": 1}]
            }}
        }"#,
    )
    .unwrap();
    let ids = names(&["a", "b"]);
    let template = capture_template(snapshot, &ids, 1);

    let columns = names(&["A", "B"]);
    let rows = vec![row(&[("A", 1.0.into()), ("B", 2.0.into())])];
    let bytes = generate_excel("Q", &columns, &rows, &ids, &[], Some(&template)).unwrap();
    let sheet = read_part(&bytes, "xl/worksheets/sheet1.xml");

    assert!(sheet.contains("<t xml:space=\"preserve\">Quarterly Report</t>"));
    assert!(sheet.contains("<c r=\"A3\"><v>1</v></c>"));
    assert!(sheet.contains("<mergeCell ref=\"A1:B1\"/>"));
    assert!(sheet.contains("ySplit=\"2\""));
    assert!(sheet.contains("<autoFilter ref=\"A2:B3\"/>"));
}

#[test]
fn test_structural_errors_produce_no_workbook() {
    let columns = names(&["A", "B"]);
    let mismatch = generate_excel("r", &columns, &[], &names(&["only-one"]), &[], None);
    assert!(matches!(mismatch, Err(ReportError::Validation(_))));

    let rows = vec![row(&[("A", 1.0.into()), ("Ghost", 2.0.into())])];
    let unknown = generate_excel("r", &columns, &rows, &names(&["a", "b"]), &[], None);
    assert!(matches!(unknown, Err(ReportError::UnknownColumn { .. })));
}
