/*!
 * Integration tests for reading and writing `.xlsx` packages
 */

use anyhow::Result;
use xltrans::errors::WorkbookError;
use xltrans::translation::batch;
use xltrans::workbook::{self, CellText, TextSurface, Workbook, XlsxWorkbook};
use crate::common;

fn cell(address: &str, text: Option<&str>) -> CellText {
    CellText {
        address: address.to_string(),
        text: text.map(str::to_string),
    }
}

/// Test that sheets, cells and shapes are discovered
#[test]
fn test_open_withSampleWorkbook_shouldExposeSheetsCellsAndShapes() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "sample.xlsx")?;

    let wb = XlsxWorkbook::open(&path)?;

    assert_eq!(wb.sheet_names(), vec!["設定", "Numbers"]);
    assert_eq!(
        wb.used_cells("設定")?,
        vec![
            cell("A1", Some("保存する")),
            cell("B1", Some("  キャンセル   ボタン ")),
            cell("C1", None),
            cell("A2", Some("=SUM(C1:C1)")),
            cell("B2", Some("A")),
            cell("C2", Some("設定画面")),
        ]
    );
    assert_eq!(wb.shape_count("設定")?, 2);
    assert_eq!(wb.shape_count("Numbers")?, 0);
    assert_eq!(
        workbook::read_shape_text(&wb, "設定", 0)?,
        Some((TextSurface::TextFrame, "メモ欄".to_string()))
    );
    assert_eq!(
        workbook::read_shape_text(&wb, "設定", 1)?,
        Some((TextSurface::AlternativeText, "会社のロゴ".to_string()))
    );
    assert!(matches!(wb.used_cells("Missing"), Err(WorkbookError::SheetNotFound(_))));
    Ok(())
}

/// Test unit collection order: cells first, then shapes, normalized
#[test]
fn test_collect_sheet_units_withSampleWorkbook_shouldSkipUntranslatable() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "sample.xlsx")?;
    let wb = XlsxWorkbook::open(&path)?;

    let units = batch::collect_sheet_units(&wb, "設定");

    let found: Vec<(String, String)> = units.iter().map(|u| (u.location.to_string(), u.text.clone())).collect();
    assert_eq!(
        found,
        vec![
            ("設定!A1".to_string(), "保存する".to_string()),
            ("設定!B1".to_string(), "キャンセル ボタン".to_string()),
            ("設定!C2".to_string(), "設定画面".to_string()),
            ("設定!shape#0".to_string(), "メモ欄".to_string()),
            ("設定!shape#1".to_string(), "会社のロゴ".to_string()),
        ]
    );
    assert!(batch::collect_sheet_units(&wb, "Numbers").is_empty());
    Ok(())
}

/// Test that writes survive a save and reopen, and untouched content is kept
#[test]
fn test_save_afterWrites_shouldReopenWithNewText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "sample.xlsx")?;
    let out = temp_dir.path().join("sample-en.xlsx");

    let mut wb = XlsxWorkbook::open(&path)?;
    wb.write_cell("設定", "A1", "Save")?;
    wb.write_cell("設定", "$C$2", "Settings <screen> & more")?;
    assert_eq!(workbook::write_shape_text(&mut wb, "設定", 0, "Notes")?, TextSurface::TextFrame);
    assert_eq!(
        workbook::write_shape_text(&mut wb, "設定", 1, "Company logo")?,
        TextSurface::AlternativeText
    );
    wb.save(&out)?;

    let reopened = XlsxWorkbook::open(&out)?;
    let cells = reopened.used_cells("設定")?;
    assert_eq!(cells[0], cell("A1", Some("Save")));
    assert_eq!(cells[1], cell("B1", Some("  キャンセル   ボタン ")));
    assert_eq!(cells[2], cell("C1", None));
    assert_eq!(cells[3], cell("A2", Some("=SUM(C1:C1)")));
    assert_eq!(cells[5], cell("C2", Some("Settings <screen> & more")));
    assert_eq!(
        workbook::read_shape_text(&reopened, "設定", 0)?,
        Some((TextSurface::TextFrame, "Notes".to_string()))
    );
    assert_eq!(
        workbook::read_shape_text(&reopened, "設定", 1)?,
        Some((TextSurface::AlternativeText, "Company logo".to_string()))
    );

    // Style index of the rewritten cell and every untouched part survive
    let sheet = common::read_part(&out, "xl/worksheets/sheet1.xml")?;
    assert!(sheet.contains(r#"<c r="A1" s="1" t="inlineStr">"#));
    assert!(sheet.contains(r#"<f>SUM(C1:C1)</f>"#));
    assert_eq!(common::read_part(&out, "docProps/app.xml")?, common::APP_PROPS);
    assert_eq!(common::read_part(&out, "xl/sharedStrings.xml")?, common::SHARED_STRINGS);
    assert_eq!(common::read_part(&out, "xl/worksheets/sheet2.xml")?, common::SHEET2);
    let drawing = common::read_part(&out, "xl/drawings/drawing1.xml")?;
    assert!(drawing.contains(r#"<a:rPr kumimoji="1" lang="ja-JP" altLang="en-US" sz="1100"/><a:t>Notes</a:t>"#));
    Ok(())
}

/// Test that a blank text frame does not take the translation meant for the alternative text
#[test]
fn test_write_shape_text_withBlankTextFrame_shouldLandOnAlternativeText() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_package(
        &temp_dir.path().join("blank.xlsx"),
        &common::sample_parts_with_drawing(common::DRAWING_BLANK_FRAME),
    )?;
    let out = temp_dir.path().join("blank-en.xlsx");

    let mut wb = XlsxWorkbook::open(&path)?;
    assert_eq!(
        workbook::read_shape_text(&wb, "設定", 0)?,
        Some((TextSurface::AlternativeText, "会社のロゴ".to_string()))
    );
    assert_eq!(
        workbook::write_shape_text(&mut wb, "設定", 0, "Company logo")?,
        TextSurface::AlternativeText
    );
    wb.save(&out)?;

    let reopened = XlsxWorkbook::open(&out)?;
    assert_eq!(
        reopened.read_shape_surface("設定", 0, TextSurface::AlternativeText)?.as_deref(),
        Some("Company logo")
    );
    assert_eq!(
        reopened.read_shape_surface("設定", 0, TextSurface::TextFrame)?.as_deref(),
        Some("\n")
    );
    assert!(!common::read_part(&out, "xl/drawings/drawing1.xml")?.contains("<a:t>"));
    Ok(())
}

/// Test that the source file is left unchanged by a save elsewhere
#[test]
fn test_save_toOtherPath_shouldNotModifySource() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "sample.xlsx")?;
    let before = std::fs::read(&path)?;

    let mut wb = XlsxWorkbook::open(&path)?;
    wb.write_cell("設定", "B1", "Cancel")?;
    wb.save(&temp_dir.path().join("copy.xlsx"))?;

    assert_eq!(std::fs::read(&path)?, before);
    Ok(())
}

/// Test that writes to cells without a value are refused
#[test]
fn test_write_cell_withEmptyOrInvalidAddress_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_sample_workbook(temp_dir.path(), "sample.xlsx")?;
    let mut wb = XlsxWorkbook::open(&path)?;

    assert!(matches!(
        wb.write_cell("設定", "Z99", "x"),
        Err(WorkbookError::InvalidCellAddress(_))
    ));
    assert!(matches!(
        wb.write_cell("設定", "1A", "x"),
        Err(WorkbookError::InvalidCellAddress(_))
    ));
    assert!(matches!(wb.write_cell("Nope", "A1", "x"), Err(WorkbookError::SheetNotFound(_))));
    Ok(())
}

/// Test that a package without a workbook part fails to open
#[test]
fn test_open_withMissingWorkbookPart_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::write_package(
        &temp_dir.path().join("empty.xlsx"),
        &[("[Content_Types].xml", common::CONTENT_TYPES)],
    )?;

    assert!(matches!(
        XlsxWorkbook::open(&path),
        Err(WorkbookError::WorkbookOpenFailed { .. })
    ));
    Ok(())
}
