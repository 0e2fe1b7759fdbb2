//! Risky-content trust gate.
//!
//! Warnings never fail a sanitization by themselves. This gate is the single
//! chokepoint that can: under `--risky-policy block`, any warning in the
//! closed risky set suppresses the output and turns the record `blocked`.

use crate::config::RiskyPolicy;
use crate::report::{Warning, WarningCode};

/// Whether a warning code marks content we refuse to vouch for.
pub fn is_risky(code: WarningCode) -> bool {
    matches!(
        code,
        WarningCode::PdfRiskOpenaction
            | WarningCode::PdfRiskJavascript
            | WarningCode::PdfRiskAction
            | WarningCode::PdfRiskForm
            | WarningCode::PdfRiskEmbeddedFile
            | WarningCode::PdfScanFailed
            | WarningCode::OfficeMacroEnabled
            | WarningCode::OfficeMacroIndicatorVbaproject
            | WarningCode::OfficeOoxmlScanFailed
            | WarningCode::ZipUnsafePath
            | WarningCode::ZipSymlinkSkipped
            | WarningCode::ZipEncryptedSkipped
            | WarningCode::ZipTooManyMembers
            | WarningCode::ZipMemberTooLarge
            | WarningCode::ZipRatioExceeded
            | WarningCode::ZipTotalBytesExceeded
            | WarningCode::ZipNestedArchiveSkipped
            | WarningCode::ZipNestedArchiveCopied
            | WarningCode::ZipNestedArchiveSanitized
            | WarningCode::ZipNestedArchiveFailed
    )
}

/// True when the configured policy suppresses this record's output.
pub fn should_block(policy: RiskyPolicy, warnings: &[Warning]) -> bool {
    match policy {
        RiskyPolicy::Warn => false,
        RiskyPolicy::Block => warnings.iter().any(|w| is_risky(w.code)),
    }
}
