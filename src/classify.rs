//! Content classification from magic bytes.
//!
//! Detection trusts leading bytes over the file extension. ZIP containers get
//! a second look at the central directory: a package carrying
//! `[Content_Types].xml` plus anything under `docProps/` is an OOXML document,
//! not a plain archive. Extension disagreements are reported, never fatal.

use crate::error::{Result, ScrubError};
use crate::report::{Warning, WarningCode};
use serde::Serialize;
use std::fs::File;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

/// Minimum prefix length the sniffer needs.
pub const SNIFF_LEN: usize = 16;

/// Detected content type, a closed set matched exhaustively at dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ContentType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/webp")]
    WebP,
    #[serde(rename = "image/tiff")]
    Tiff,
    #[serde(rename = "application/pdf")]
    Pdf,
    #[serde(rename = "application/zip")]
    Zip,
    #[serde(rename = "application/ooxml")]
    Ooxml,
    #[serde(rename = "unknown")]
    Unknown,
}

impl ContentType {
    pub fn is_supported(self) -> bool {
        self != ContentType::Unknown
    }

    pub fn is_image(self) -> bool {
        matches!(self, ContentType::Jpeg | ContentType::Png | ContentType::WebP | ContentType::Tiff)
    }

    /// Extensions conventionally used for this type, lowercase, no dot.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ContentType::Jpeg => &["jpg", "jpeg"],
            ContentType::Png => &["png"],
            ContentType::WebP => &["webp"],
            ContentType::Tiff => &["tif", "tiff"],
            ContentType::Pdf => &["pdf"],
            ContentType::Zip => &["zip"],
            ContentType::Ooxml => &[
                "docx", "xlsx", "pptx", "docm", "xlsm", "pptm", "dotx", "dotm", "xltx", "xltm",
                "potx", "potm",
            ],
            ContentType::Unknown => &[],
        }
    }

    /// The type an extension claims, if it claims a supported one.
    pub fn implied_by_extension(ext: &str) -> Option<ContentType> {
        let ext = ext.to_ascii_lowercase();
        for candidate in [
            ContentType::Jpeg,
            ContentType::Png,
            ContentType::WebP,
            ContentType::Tiff,
            ContentType::Pdf,
            ContentType::Zip,
            ContentType::Ooxml,
        ] {
            if candidate.extensions().contains(&ext.as_str()) {
                return Some(candidate);
            }
        }
        None
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ContentType::Jpeg => "image/jpeg",
            ContentType::Png => "image/png",
            ContentType::WebP => "image/webp",
            ContentType::Tiff => "image/tiff",
            ContentType::Pdf => "application/pdf",
            ContentType::Zip => "application/zip",
            ContentType::Ooxml => "application/ooxml",
            ContentType::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Sniff a byte prefix. Pure function; no ZIP refinement.
pub fn sniff_prefix(prefix: &[u8]) -> ContentType {
    if prefix.len() >= 3 && prefix[0] == 0xFF && prefix[1] == 0xD8 && prefix[2] == 0xFF {
        return ContentType::Jpeg;
    }
    if prefix.starts_with(b"\x89PNG\r\n\x1a\n") {
        return ContentType::Png;
    }
    if prefix.len() >= 12 && prefix.starts_with(b"RIFF") && &prefix[8..12] == b"WEBP" {
        return ContentType::WebP;
    }
    if prefix.starts_with(b"II*\0") || prefix.starts_with(b"MM\0*") {
        return ContentType::Tiff;
    }
    if prefix.starts_with(b"%PDF-") {
        return ContentType::Pdf;
    }
    if prefix.starts_with(b"PK\x03\x04") || prefix.starts_with(b"PK\x05\x06") {
        return ContentType::Zip;
    }
    ContentType::Unknown
}

/// Decide whether a ZIP central directory describes an OOXML package.
fn is_ooxml_directory<R: Read + Seek>(archive: &zip::ZipArchive<R>) -> bool {
    let mut has_content_types = false;
    let mut has_doc_props = false;
    for name in archive.file_names() {
        let name = name.replace('\\', "/");
        if name == "[Content_Types].xml" {
            has_content_types = true;
        } else if name.starts_with("docProps/") {
            has_doc_props = true;
        }
        if has_content_types && has_doc_props {
            return true;
        }
    }
    false
}

/// Classify an in-memory buffer, refining ZIP containers to OOXML when the
/// central directory says so. An unreadable central directory leaves the
/// type at `Zip`; the archive engine reports the real failure.
pub fn classify_bytes(bytes: &[u8]) -> ContentType {
    let detected = sniff_prefix(bytes);
    if detected != ContentType::Zip {
        return detected;
    }
    match zip::ZipArchive::new(Cursor::new(bytes)) {
        Ok(archive) if is_ooxml_directory(&archive) => ContentType::Ooxml,
        _ => ContentType::Zip,
    }
}

/// Classify a file on disk by its leading bytes, with ZIP refinement.
pub fn classify_file(path: &Path) -> Result<ContentType> {
    let mut file = File::open(path).map_err(ScrubError::Io)?;
    let mut prefix = [0u8; SNIFF_LEN];
    let mut filled = 0;
    while filled < SNIFF_LEN {
        let n = file.read(&mut prefix[filled..])?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    let detected = sniff_prefix(&prefix[..filled]);
    if detected != ContentType::Zip {
        return Ok(detected);
    }
    match zip::ZipArchive::new(file) {
        Ok(archive) if is_ooxml_directory(&archive) => Ok(ContentType::Ooxml),
        _ => Ok(ContentType::Zip),
    }
}

/// Outcome of reconciling detected type against the declared extension.
#[derive(Debug, Clone)]
pub struct Classification {
    pub content_type: ContentType,
    pub warning: Option<Warning>,
}

/// Reconcile magic-byte detection with the declared extension.
///
/// Bytes are authoritative. A supported detection with a disagreeing
/// extension warns `content_type_detected` (`content_type_detected_ooxml`
/// when the ZIP refinement upgraded the type); a supported-looking extension
/// over unrecognizable bytes warns `content_type_mismatch` and the input is
/// handled as `unknown`.
pub fn reconcile(detected: ContentType, extension: Option<&str>) -> Classification {
    let implied = extension.and_then(ContentType::implied_by_extension);

    if detected.is_supported() {
        if implied == Some(detected) {
            return Classification { content_type: detected, warning: None };
        }
        let ext_text = extension.map_or_else(|| "no extension".to_string(), |e| format!(".{e}"));
        let warning = if detected == ContentType::Ooxml {
            Warning::new(
                WarningCode::ContentTypeDetectedOoxml,
                format!("{ext_text} container is an OOXML package; treating as {detected}"),
            )
        } else {
            Warning::new(
                WarningCode::ContentTypeDetected,
                format!("content detected as {detected} despite {ext_text}; trusting the bytes"),
            )
        };
        return Classification { content_type: detected, warning: Some(warning) };
    }

    if let Some(expected) = implied {
        return Classification {
            content_type: ContentType::Unknown,
            warning: Some(Warning::new(
                WarningCode::ContentTypeMismatch,
                format!(
                    "extension .{} implies {expected} but the bytes do not match; treating as unknown",
                    extension.unwrap_or_default()
                ),
            )),
        };
    }

    Classification { content_type: ContentType::Unknown, warning: None }
}

/// The declared extension of a path, lowercase.
pub fn declared_extension(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_ascii_lowercase())
}
