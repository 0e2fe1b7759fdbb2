//! Report records and the JSONL sink.
//!
//! Every processed input produces exactly one [`Record`], appended to the
//! report as a single JSON line and flushed immediately so a crashed run
//! still leaves a usable prefix. An optional `{"type":"summary"}` line is
//! appended last.

use crate::config::SanitizeConfig;
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Schema version stamped on every record.
pub const REPORT_VERSION: u32 = 1;

/// Terminal outcome of one input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ImageSanitized,
    PdfSanitized,
    OfficeSanitized,
    ZipSanitized,
    Copied,
    Skipped,
    Excluded,
    Blocked,
    Error,
    Truncated,
    WouldImageSanitize,
    WouldPdfSanitize,
    WouldOfficeSanitize,
    WouldZipSanitize,
    WouldCopy,
    WouldSkip,
    WouldBlock,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::ImageSanitized => "image_sanitized",
            Action::PdfSanitized => "pdf_sanitized",
            Action::OfficeSanitized => "office_sanitized",
            Action::ZipSanitized => "zip_sanitized",
            Action::Copied => "copied",
            Action::Skipped => "skipped",
            Action::Excluded => "excluded",
            Action::Blocked => "blocked",
            Action::Error => "error",
            Action::Truncated => "truncated",
            Action::WouldImageSanitize => "would_image_sanitize",
            Action::WouldPdfSanitize => "would_pdf_sanitize",
            Action::WouldOfficeSanitize => "would_office_sanitize",
            Action::WouldZipSanitize => "would_zip_sanitize",
            Action::WouldCopy => "would_copy",
            Action::WouldSkip => "would_skip",
            Action::WouldBlock => "would_block",
        }
    }

    /// The dry-run analogue of a write-producing action. Actions that never
    /// write (`excluded`, `error`, `truncated`, ...) keep their names.
    pub fn dry_run_analogue(self) -> Action {
        match self {
            Action::ImageSanitized => Action::WouldImageSanitize,
            Action::PdfSanitized => Action::WouldPdfSanitize,
            Action::OfficeSanitized => Action::WouldOfficeSanitize,
            Action::ZipSanitized => Action::WouldZipSanitize,
            Action::Copied => Action::WouldCopy,
            Action::Skipped => Action::WouldSkip,
            Action::Blocked => Action::WouldBlock,
            other => other,
        }
    }

    /// Actions that make the run exit with code 2.
    pub fn is_failure(self) -> bool {
        matches!(self, Action::Error | Action::Blocked | Action::WouldBlock)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Closed warning taxonomy. The serialized code is the stable interface;
/// messages are advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningCode {
    ContentTypeDetected,
    ContentTypeDetectedOoxml,
    ContentTypeMismatch,
    PdfRiskOpenaction,
    PdfRiskJavascript,
    PdfRiskAction,
    PdfRiskForm,
    PdfRiskEmbeddedFile,
    PdfScanFailed,
    OfficeMacroEnabled,
    OfficeMacroIndicatorVbaproject,
    OfficeOoxmlScanFailed,
    ZipUnsafePath,
    ZipSymlinkSkipped,
    ZipEncryptedSkipped,
    ZipDuplicateSkipped,
    ZipTooManyMembers,
    ZipMemberTooLarge,
    ZipRatioExceeded,
    ZipTotalBytesExceeded,
    ZipNestedArchiveSkipped,
    ZipNestedArchiveCopied,
    ZipNestedArchiveSanitized,
    ZipNestedArchiveFailed,
    ZipUnsupportedSkipped,
    ZipMemberSanitizeFailed,
    ExcludedByPattern,
    AllowlistSkipped,
    UnsupportedSkipped,
    SymlinkSkipped,
    OutputExists,
    TraversalTruncated,
}

impl WarningCode {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningCode::ContentTypeDetected => "content_type_detected",
            WarningCode::ContentTypeDetectedOoxml => "content_type_detected_ooxml",
            WarningCode::ContentTypeMismatch => "content_type_mismatch",
            WarningCode::PdfRiskOpenaction => "pdf_risk_openaction",
            WarningCode::PdfRiskJavascript => "pdf_risk_javascript",
            WarningCode::PdfRiskAction => "pdf_risk_action",
            WarningCode::PdfRiskForm => "pdf_risk_form",
            WarningCode::PdfRiskEmbeddedFile => "pdf_risk_embedded_file",
            WarningCode::PdfScanFailed => "pdf_scan_failed",
            WarningCode::OfficeMacroEnabled => "office_macro_enabled",
            WarningCode::OfficeMacroIndicatorVbaproject => "office_macro_indicator_vbaproject",
            WarningCode::OfficeOoxmlScanFailed => "office_ooxml_scan_failed",
            WarningCode::ZipUnsafePath => "zip_unsafe_path",
            WarningCode::ZipSymlinkSkipped => "zip_symlink_skipped",
            WarningCode::ZipEncryptedSkipped => "zip_encrypted_skipped",
            WarningCode::ZipDuplicateSkipped => "zip_duplicate_skipped",
            WarningCode::ZipTooManyMembers => "zip_too_many_members",
            WarningCode::ZipMemberTooLarge => "zip_member_too_large",
            WarningCode::ZipRatioExceeded => "zip_ratio_exceeded",
            WarningCode::ZipTotalBytesExceeded => "zip_total_bytes_exceeded",
            WarningCode::ZipNestedArchiveSkipped => "zip_nested_archive_skipped",
            WarningCode::ZipNestedArchiveCopied => "zip_nested_archive_copied",
            WarningCode::ZipNestedArchiveSanitized => "zip_nested_archive_sanitized",
            WarningCode::ZipNestedArchiveFailed => "zip_nested_archive_failed",
            WarningCode::ZipUnsupportedSkipped => "zip_unsupported_skipped",
            WarningCode::ZipMemberSanitizeFailed => "zip_member_sanitize_failed",
            WarningCode::ExcludedByPattern => "excluded_by_pattern",
            WarningCode::AllowlistSkipped => "allowlist_skipped",
            WarningCode::UnsupportedSkipped => "unsupported_skipped",
            WarningCode::SymlinkSkipped => "symlink_skipped",
            WarningCode::OutputExists => "output_exists",
            WarningCode::TraversalTruncated => "traversal_truncated",
        }
    }
}

impl std::fmt::Display for WarningCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One warning attached to a record, in emission order.
#[derive(Debug, Clone, Serialize)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl Warning {
    pub fn new<S: Into<String>>(code: WarningCode, message: S) -> Self {
        Self { code, message: message.into() }
    }

    /// Rewrap a warning produced while sanitizing an archive member so the
    /// member name survives aggregation into the archive-level record.
    pub fn for_member(&self, member: &str) -> Warning {
        Warning { code: self.code, message: format!("zip entry '{member}': {}", self.message) }
    }
}

/// One JSONL report line. Field order is part of the report contract.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub report_version: u32,
    pub input_path: String,
    pub output_path: Option<String>,
    pub action: Action,
    pub warnings: Vec<Warning>,
    pub error: Option<String>,
}

impl Record {
    pub fn new<S: Into<String>>(input_path: S, action: Action) -> Self {
        Self {
            report_version: REPORT_VERSION,
            input_path: input_path.into(),
            output_path: None,
            action,
            warnings: Vec::new(),
            error: None,
        }
    }

    pub fn with_output(mut self, output_path: Option<String>) -> Self {
        self.output_path = output_path;
        self
    }

    pub fn with_warnings(mut self, warnings: Vec<Warning>) -> Self {
        self.warnings = warnings;
        self
    }

    pub fn with_error<S: Into<String>>(mut self, error: S) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Terminal summary line, emitted last when `--report-summary` is set.
#[derive(Debug, Serialize)]
pub struct Summary {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub report_version: u32,
    pub dry_run: bool,
    pub exit_code: i32,
    pub files: u64,
    pub warnings: u64,
    pub errors: u64,
    pub counts: BTreeMap<&'static str, u64>,
    pub tool_version: &'static str,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: u64,
    pub input: String,
    pub out: Option<String>,
    pub report: String,
    pub options: SanitizeConfig,
}

enum Sink {
    Stdout(std::io::Stdout),
    File(BufWriter<File>),
}

/// Append-only JSONL writer over a file path or stdout (`-`).
pub struct ReportWriter {
    sink: Sink,
    stdout: bool,
}

impl ReportWriter {
    /// Open the sink. The single character `-` selects stdout; anything else
    /// is created (truncating) as a regular file, parents included.
    pub fn open(target: &str) -> Result<Self> {
        if target == "-" {
            return Ok(Self { sink: Sink::Stdout(std::io::stdout()), stdout: true });
        }
        let path = Path::new(target);
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)?;
        Ok(Self { sink: Sink::File(BufWriter::new(file)), stdout: false })
    }

    /// True when records go to stdout rather than a file.
    pub fn is_stdout(&self) -> bool {
        self.stdout
    }

    pub fn write_record(&mut self, record: &Record) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.write_line(&line)
    }

    pub fn write_summary(&mut self, summary: &Summary) -> Result<()> {
        let line = serde_json::to_string(summary)?;
        self.write_line(&line)
    }

    // Flush per line so partially completed runs still leave a valid report.
    fn write_line(&mut self, line: &str) -> Result<()> {
        match &mut self.sink {
            Sink::Stdout(out) => {
                let mut lock = out.lock();
                writeln!(lock, "{line}")?;
                lock.flush()?;
            }
            Sink::File(file) => {
                writeln!(file, "{line}")?;
                file.flush()?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_serializes_with_stable_field_order() {
        let record = Record::new("in/a.jpg", Action::ImageSanitized)
            .with_output(Some("out/a.jpg".into()));
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            r#"{"report_version":1,"input_path":"in/a.jpg","output_path":"out/a.jpg","action":"image_sanitized","warnings":[],"error":null}"#
        );
    }

    #[test]
    fn warning_codes_serialize_snake_case() {
        let warning = Warning::new(WarningCode::ZipUnsafePath, "bad");
        let json = serde_json::to_string(&warning).unwrap();
        assert_eq!(json, r#"{"code":"zip_unsafe_path","message":"bad"}"#);
        assert_eq!(WarningCode::PdfRiskOpenaction.as_str(), "pdf_risk_openaction");
        assert_eq!(
            WarningCode::OfficeMacroIndicatorVbaproject.as_str(),
            "office_macro_indicator_vbaproject"
        );
    }

    #[test]
    fn dry_run_analogue_only_renames_write_actions() {
        assert_eq!(Action::ImageSanitized.dry_run_analogue(), Action::WouldImageSanitize);
        assert_eq!(Action::Blocked.dry_run_analogue(), Action::WouldBlock);
        assert_eq!(Action::Excluded.dry_run_analogue(), Action::Excluded);
        assert_eq!(Action::Error.dry_run_analogue(), Action::Error);
        assert_eq!(Action::Truncated.dry_run_analogue(), Action::Truncated);
    }

    #[test]
    fn member_warnings_carry_the_member_name() {
        let inner = Warning::new(WarningCode::PdfRiskOpenaction, "document has /OpenAction");
        let wrapped = inner.for_member("docs/evil.pdf");
        assert_eq!(wrapped.code, WarningCode::PdfRiskOpenaction);
        assert_eq!(wrapped.message, "zip entry 'docs/evil.pdf': document has /OpenAction");
    }

    #[test]
    fn report_writer_appends_jsonl_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.jsonl");
        let mut writer = ReportWriter::open(path.to_str().unwrap()).unwrap();
        writer.write_record(&Record::new("a", Action::Copied)).unwrap();
        writer.write_record(&Record::new("b", Action::Skipped)).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].contains(r#""input_path":"a""#));
        assert!(lines[1].contains(r#""action":"skipped""#));
    }
}
