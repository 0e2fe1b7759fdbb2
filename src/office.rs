//! OOXML package rewriting.
//!
//! An Office document is a ZIP package; sanitizing it means assembling a new
//! package without the `docProps/` part (core, app and custom properties,
//! thumbnails) while copying every remaining entry bit for bit, compressed
//! payload included. Macro content is reported, never touched.

use crate::error::{Result, ScrubError};
use crate::report::{Warning, WarningCode};
use std::io::Cursor;
use tracing::debug;

/// Extensions that declare macro-enabled Office documents.
pub const MACRO_ENABLED_EXTENSIONS: &[&str] = &["docm", "xlsm", "pptm", "dotm", "xltm", "potm"];

/// Result of sanitizing one OOXML package.
#[derive(Debug)]
pub struct OfficeOutcome {
    pub bytes: Vec<u8>,
    pub warnings: Vec<Warning>,
}

fn normalized(name: &str) -> String {
    name.replace('\\', "/")
}

fn is_doc_props(name: &str) -> bool {
    let name = normalized(name);
    name == "docProps" || name.starts_with("docProps/")
}

fn is_vba_project(name: &str) -> bool {
    let name = normalized(name);
    name.rsplit('/').next().is_some_and(|leaf| leaf.eq_ignore_ascii_case("vbaProject.bin"))
}

fn macro_warnings(names: &[String], declared_ext: Option<&str>) -> Vec<Warning> {
    let mut warnings = Vec::new();
    if let Some(ext) = declared_ext {
        if MACRO_ENABLED_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
            warnings.push(Warning::new(
                WarningCode::OfficeMacroEnabled,
                format!("macro-enabled document extension .{ext}; macros are not removed"),
            ));
        }
    }
    if let Some(name) = names.iter().find(|n| is_vba_project(n)) {
        warnings.push(Warning::new(
            WarningCode::OfficeMacroIndicatorVbaproject,
            format!("package contains a VBA project ({name}); macros are not removed"),
        ));
    }
    warnings
}

/// Scan only (dry-run): verify the package opens and report macro signals.
pub fn scan_ooxml(bytes: &[u8], declared_ext: Option<&str>) -> Result<Vec<Warning>> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ScrubError::office(format!("failed to open package: {e}")))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    Ok(macro_warnings(&names, declared_ext))
}

/// Rewrite the package without `docProps/*`, preserving all other entries
/// bit for bit, in their original order.
pub fn sanitize_ooxml(bytes: &[u8], declared_ext: Option<&str>) -> Result<OfficeOutcome> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| ScrubError::office(format!("failed to open package: {e}")))?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();
    let warnings = macro_warnings(&names, declared_ext);

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for index in 0..archive.len() {
        let entry = archive
            .by_index_raw(index)
            .map_err(|e| ScrubError::office(format!("failed to read package entry: {e}")))?;
        if is_doc_props(entry.name()) {
            debug!("dropping document property part: {}", entry.name());
            continue;
        }
        writer
            .raw_copy_file(entry)
            .map_err(|e| ScrubError::office(format!("failed to copy package entry: {e}")))?;
    }
    let cursor = writer
        .finish()
        .map_err(|e| ScrubError::office(format!("failed to finish package: {e}")))?;
    Ok(OfficeOutcome { bytes: cursor.into_inner(), warnings })
}
