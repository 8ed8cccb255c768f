/*!
 * Tests for file utility functions
 */

use anyhow::Result;
use std::fs;
use std::path::Path;
use xltrans::file_utils::{FileManager, FileType};
use crate::common;

/// Test that file_exists returns true for existing files
#[test]
fn test_file_exists_withExistingFile_shouldReturnTrue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_file = common::create_test_file(temp_dir.path(), "test_file_exists.tmp", "test content")?;

    assert!(FileManager::file_exists(&test_file));
    assert!(!FileManager::dir_exists(&test_file));

    Ok(())
}

/// Test that file_exists returns false for non-existent files
#[test]
fn test_file_exists_withNonExistentFile_shouldReturnFalse() {
    assert!(!FileManager::file_exists("non_existent_file.tmp"));
}

/// Test that generate_output_path appends the target language to the stem
#[test]
fn test_generate_output_path_withValidInputs_shouldCreateCorrectPath() {
    let input_file = Path::new("/tmp/input/仕様書.xlsx");
    let output_dir = Path::new("/tmp/output");

    let output_path = FileManager::generate_output_path(input_file, output_dir, "en");

    assert_eq!(output_path, Path::new("/tmp/output/仕様書-en.xlsx"));
}

/// Test that generate_output_path keeps the original extension spelling
#[test]
fn test_generate_output_path_withUppercaseExtension_shouldKeepIt() {
    let output_path = FileManager::generate_output_path("report.v2.XLSX", "out", "vi");
    assert_eq!(output_path, Path::new("out/report.v2-vi.XLSX"));
}

/// Test that ensure_dir creates directories as needed
#[test]
fn test_ensure_dir_withNonExistentDir_shouldCreateDirectory() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let test_subdir = temp_dir.path().join("a").join("b");

    FileManager::ensure_dir(&test_subdir)?;

    assert!(test_subdir.is_dir());
    Ok(())
}

/// Test that find_workbooks filters and orders the directory listing
#[test]
fn test_find_workbooks_withMixedFiles_shouldReturnSortedWorkbooks() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let dir = temp_dir.path();
    common::create_test_file(dir, "b.xlsx", "")?;
    common::create_test_file(dir, "A.XLSX", "")?;
    common::create_test_file(dir, "legacy.xls", "")?;
    common::create_test_file(dir, "~$b.xlsx", "")?;
    common::create_test_file(dir, "notes.txt", "")?;
    common::create_test_file(dir, "macro.xlsm", "")?;
    fs::create_dir(dir.join("nested.xlsx"))?;
    fs::create_dir(dir.join("sub"))?;
    common::create_test_file(&dir.join("sub"), "deep.xlsx", "")?;

    let names: Vec<String> = FileManager::find_workbooks(dir)?
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();

    assert_eq!(names, vec!["A.XLSX", "b.xlsx", "legacy.xls"]);
    Ok(())
}

/// Test that find_workbooks on an empty directory returns nothing
#[test]
fn test_find_workbooks_withEmptyDir_shouldReturnEmpty() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    assert!(FileManager::find_workbooks(temp_dir.path())?.is_empty());
    Ok(())
}

/// Test file type detection
#[test]
fn test_detect_file_type_withKnownExtensions_shouldClassify() {
    assert_eq!(FileManager::detect_file_type("x.xlsx"), FileType::Workbook);
    assert_eq!(FileManager::detect_file_type("x.Xls"), FileType::LegacyWorkbook);
    assert_eq!(FileManager::detect_file_type("x.csv"), FileType::Other);
}

/// Test that relative paths resolve next to the executable
#[test]
fn test_resolve_relative_to_exe_withRelativePath_shouldJoinExeDir() -> Result<()> {
    let resolved = FileManager::resolve_relative_to_exe("input")?;
    assert_eq!(resolved, FileManager::exe_dir()?.join("input"));
    assert!(resolved.is_absolute());
    Ok(())
}
