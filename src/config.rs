use crate::error::{Result, ScrubError};
use serde::Serialize;

/// Default guardrails for archive sanitization.
pub const DEFAULT_ZIP_MAX_MEMBERS: u64 = 10_000;
pub const DEFAULT_ZIP_MAX_MEMBER_BYTES: u64 = 128 * 1024 * 1024; // 128 MiB
pub const DEFAULT_ZIP_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB
pub const DEFAULT_ZIP_MAX_COMPRESSION_RATIO: u64 = 100;
pub const DEFAULT_NESTED_ARCHIVE_MAX_DEPTH: u64 = 4;
pub const DEFAULT_NESTED_ARCHIVE_MAX_TOTAL_BYTES: u64 = 1024 * 1024 * 1024; // 1 GiB

/// Ceilings that bound what a single ZIP archive may cost to sanitize.
///
/// The ratio limit is evaluated from central-directory metadata before any
/// decompression; member and total limits are enforced again on the actual
/// decompressed byte counts, so lying headers cannot bypass them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ZipLimits {
    /// Maximum number of members written to the output archive
    pub max_members: u64,
    /// Maximum uncompressed size of any single member
    pub max_member_bytes: u64,
    /// Maximum aggregate uncompressed bytes read from the archive
    pub max_total_bytes: u64,
    /// Maximum uncompressed/compressed ratio per member (zip-bomb guard)
    pub max_compression_ratio: u64,
}

impl Default for ZipLimits {
    fn default() -> Self {
        Self {
            max_members: DEFAULT_ZIP_MAX_MEMBERS,
            max_member_bytes: DEFAULT_ZIP_MAX_MEMBER_BYTES,
            max_total_bytes: DEFAULT_ZIP_MAX_TOTAL_BYTES,
            max_compression_ratio: DEFAULT_ZIP_MAX_COMPRESSION_RATIO,
        }
    }
}

/// Budgets for recursing into archives found inside archives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NestedLimits {
    /// Maximum nesting depth reached by the `sanitize` policy
    pub max_depth: u64,
    /// Aggregate decompressed-byte budget shared across the whole recursion
    pub max_total_bytes: u64,
}

impl Default for NestedLimits {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_NESTED_ARCHIVE_MAX_DEPTH,
            max_total_bytes: DEFAULT_NESTED_ARCHIVE_MAX_TOTAL_BYTES,
        }
    }
}

/// Ceilings for directory traversal. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraversalLimits {
    pub max_files: Option<u64>,
    pub max_bytes: Option<u64>,
}

/// What to do with an archive discovered as a member of another archive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum NestedArchivePolicy {
    /// Drop the member (default)
    Skip,
    /// Keep the raw member bytes untouched
    Copy,
    /// Recurse and sanitize the nested archive in place
    Sanitize,
}

/// How to treat inputs whose warnings include a risky finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum RiskyPolicy {
    /// Emit the warnings and keep the output (default)
    Warn,
    /// Suppress the output and mark the record `blocked`
    Block,
}

/// Effective options for one sanitization run.
#[derive(Debug, Clone, Serialize)]
pub struct SanitizeConfig {
    /// Flatten outputs into one directory, disambiguating collisions
    pub flat: bool,
    /// Permit replacing existing outputs
    pub overwrite: bool,
    /// Raw-copy files of unsupported type instead of skipping them
    pub copy_unsupported: bool,
    /// Report only; write nothing
    pub dry_run: bool,
    /// Glob patterns pruned from traversal, relative to the input root
    pub exclude: Vec<String>,
    /// Allowlist of extensions, matched against the detected content type
    pub allow_ext: Vec<String>,
    pub traversal: TraversalLimits,
    pub zip: ZipLimits,
    pub nested_policy: NestedArchivePolicy,
    pub nested: NestedLimits,
    pub risky_policy: RiskyPolicy,
    /// Exit 3 when any warning was emitted
    pub fail_on_warnings: bool,
    /// Append a terminal summary record to the report
    pub report_summary: bool,
    /// Suppress the human summary on stderr
    pub quiet: bool,
}

impl Default for SanitizeConfig {
    fn default() -> Self {
        Self {
            flat: false,
            overwrite: true,
            copy_unsupported: true,
            dry_run: false,
            exclude: Vec::new(),
            allow_ext: Vec::new(),
            traversal: TraversalLimits::default(),
            zip: ZipLimits::default(),
            nested_policy: NestedArchivePolicy::Skip,
            nested: NestedLimits::default(),
            risky_policy: RiskyPolicy::Warn,
            fail_on_warnings: false,
            report_summary: false,
            quiet: false,
        }
    }
}

impl SanitizeConfig {
    /// Validate the configuration and return errors for unusable settings.
    pub fn validate(&self) -> Result<()> {
        if self.zip.max_members == 0 {
            return Err(ScrubError::configuration("zip-max-members must be greater than 0"));
        }
        if self.zip.max_member_bytes == 0 {
            return Err(ScrubError::configuration("zip-max-member-bytes must be greater than 0"));
        }
        if self.zip.max_total_bytes == 0 {
            return Err(ScrubError::configuration("zip-max-total-bytes must be greater than 0"));
        }
        if self.zip.max_compression_ratio == 0 {
            return Err(ScrubError::configuration(
                "zip-max-compression-ratio must be greater than 0",
            ));
        }
        if self.nested.max_depth == 0 {
            return Err(ScrubError::configuration(
                "nested-archive-max-depth must be greater than 0",
            ));
        }
        if self.traversal.max_files == Some(0) {
            return Err(ScrubError::configuration("max-files must be greater than 0"));
        }
        for pattern in &self.exclude {
            glob::Pattern::new(pattern).map_err(|e| {
                ScrubError::configuration(format!("invalid exclude pattern '{pattern}': {e}"))
            })?;
        }
        Ok(())
    }
}
