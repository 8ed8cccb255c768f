use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

// @const: Prefix of the lock files office suites leave next to open workbooks
const LOCK_FILE_PREFIX: &str = "~$";

/// Kind of file found in the input directory
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    /// Office Open XML workbook (`.xlsx`)
    Workbook,
    /// Legacy binary workbook (`.xls`)
    LegacyWorkbook,
    /// Anything else
    Other,
}

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Output path for a translated workbook
    // @params: input_file, output_dir, target_language
    pub fn generate_output_path<P1: AsRef<Path>, P2: AsRef<Path>>(
        input_file: P1,
        output_dir: P2,
        target_language: &str,
    ) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        // <stem>-<lang><.ext>
        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('-');
        output_filename.push_str(target_language);
        if let Some(ext) = input_file.extension() {
            output_filename.push('.');
            output_filename.push_str(&ext.to_string_lossy());
        }

        output_dir.as_ref().join(output_filename)
    }

    /// Classify a path by its extension, ignoring case
    pub fn detect_file_type<P: AsRef<Path>>(path: P) -> FileType {
        match path
            .as_ref()
            .extension()
            .map(|ext| ext.to_string_lossy().to_lowercase())
            .as_deref()
        {
            Some("xlsx") => FileType::Workbook,
            Some("xls") => FileType::LegacyWorkbook,
            _ => FileType::Other,
        }
    }

    /// Check whether a file name marks an office lock file
    pub fn is_lock_file<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_name()
            .is_some_and(|name| name.to_string_lossy().starts_with(LOCK_FILE_PREFIX))
    }

    /// Find workbooks directly inside a directory, sorted by file name
    ///
    /// Subdirectories are not searched and lock files are skipped.
    pub fn find_workbooks<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if !entry.file_type().is_file() || Self::detect_file_type(path) == FileType::Other {
                continue;
            }
            if Self::is_lock_file(path) {
                info!("Skipping temporary file: {}", entry.file_name().to_string_lossy());
                continue;
            }

            result.push(path.to_path_buf());
        }

        debug!("Found {} workbook(s) in {:?}", result.len(), dir.as_ref());
        Ok(result)
    }

    /// Resolve a relative path against a base directory; absolute paths are kept
    pub fn resolve_against<P1: AsRef<Path>, P2: AsRef<Path>>(path: P1, base: P2) -> PathBuf {
        let path = path.as_ref();
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            base.as_ref().join(path)
        }
    }

    /// Directory containing the running executable
    pub fn exe_dir() -> Result<PathBuf> {
        let exe = std::env::current_exe().context("Failed to locate the running executable")?;
        exe.parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| anyhow::anyhow!("Executable has no parent directory: {:?}", exe))
    }

    /// Resolve a relative path against the executable's directory
    pub fn resolve_relative_to_exe<P: AsRef<Path>>(path: P) -> Result<PathBuf> {
        if path.as_ref().is_absolute() {
            return Ok(path.as_ref().to_path_buf());
        }
        Ok(Self::resolve_against(path, Self::exe_dir()?))
    }
}
