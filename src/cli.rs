//! Command-line interface definitions and parsing.
//!
//! This module defines the CLI structure using clap:
//! - The `sanitize` subcommand and its flags
//! - Guardrail and policy options
//! - Conversion into the engine's [`RunOptions`]

use crate::config::{
    NestedArchivePolicy, NestedLimits, RiskyPolicy, SanitizeConfig, TraversalLimits, ZipLimits,
    DEFAULT_NESTED_ARCHIVE_MAX_DEPTH, DEFAULT_NESTED_ARCHIVE_MAX_TOTAL_BYTES,
    DEFAULT_ZIP_MAX_COMPRESSION_RATIO, DEFAULT_ZIP_MAX_MEMBERS, DEFAULT_ZIP_MAX_MEMBER_BYTES,
    DEFAULT_ZIP_MAX_TOTAL_BYTES,
};
use crate::error::{Result, ScrubError};
use crate::run::RunOptions;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "scrub")]
#[command(about = "Batch file sanitizer: strips metadata from images, PDFs and Office documents")]
#[command(version)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Produce sanitized copies of a file, directory tree, or ZIP archive
    Sanitize(SanitizeArgs),
}

#[derive(clap::Args, Debug)]
pub struct SanitizeArgs {
    /// File, directory, or .zip archive to sanitize
    #[arg(long, value_name = "PATH")]
    pub input: PathBuf,

    /// Output root (required unless --dry-run)
    #[arg(long, value_name = "PATH")]
    pub out: Option<PathBuf>,

    /// JSONL report sink; '-' writes to stdout
    #[arg(long, value_name = "PATH|-", default_value = "-")]
    pub report: String,

    /// Append a terminal summary record to the report
    #[arg(long)]
    pub report_summary: bool,

    /// Report without writing; actions become would_*
    #[arg(long)]
    pub dry_run: bool,

    /// Flatten outputs into one directory, numbering collisions
    #[arg(long)]
    pub flat: bool,

    /// Permit overwriting existing outputs (default)
    #[arg(long, overrides_with = "no_overwrite")]
    pub overwrite: bool,

    /// Forbid overwriting; existing outputs are skipped
    #[arg(long)]
    pub no_overwrite: bool,

    /// Raw-copy files of unsupported type (default)
    #[arg(long, overrides_with = "no_copy_unsupported")]
    pub copy_unsupported: bool,

    /// Skip files of unsupported type instead of copying
    #[arg(long)]
    pub no_copy_unsupported: bool,

    /// Glob pruned during traversal, relative to the input root (repeatable)
    #[arg(long, value_name = "GLOB")]
    pub exclude: Vec<String>,

    /// Allowlist by detected content type, e.g. '.jpg' (repeatable)
    #[arg(long, value_name = ".EXT")]
    pub allow_ext: Vec<String>,

    /// Stop traversal after this many files
    #[arg(long, value_name = "N")]
    pub max_files: Option<u64>,

    /// Stop traversal after this many input bytes
    #[arg(long, value_name = "N")]
    pub max_bytes: Option<u64>,

    /// Maximum members kept per archive
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ZIP_MAX_MEMBERS)]
    pub zip_max_members: u64,

    /// Maximum uncompressed bytes per archive member
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ZIP_MAX_MEMBER_BYTES)]
    pub zip_max_member_bytes: u64,

    /// Maximum aggregate uncompressed bytes per archive
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ZIP_MAX_TOTAL_BYTES)]
    pub zip_max_total_bytes: u64,

    /// Maximum per-member compression ratio (zip-bomb guard)
    #[arg(long, value_name = "N", default_value_t = DEFAULT_ZIP_MAX_COMPRESSION_RATIO)]
    pub zip_max_compression_ratio: u64,

    /// What to do with archives found inside archives
    #[arg(long, value_enum, value_name = "POLICY", default_value = "skip")]
    pub nested_archive_policy: NestedArchivePolicy,

    /// Maximum recursion depth for --nested-archive-policy sanitize
    #[arg(long, value_name = "N", default_value_t = DEFAULT_NESTED_ARCHIVE_MAX_DEPTH)]
    pub nested_archive_max_depth: u64,

    /// Aggregate byte budget for nested-archive recursion
    #[arg(long, value_name = "N", default_value_t = DEFAULT_NESTED_ARCHIVE_MAX_TOTAL_BYTES)]
    pub nested_archive_max_total_bytes: u64,

    /// Treatment of risky findings: warn and keep, or block the output
    #[arg(long, value_enum, value_name = "POLICY", default_value = "warn")]
    pub risky_policy: RiskyPolicy,

    /// Exit 3 when any warning was emitted
    #[arg(long)]
    pub fail_on_warnings: bool,

    /// Suppress the human summary on stderr
    #[arg(long)]
    pub quiet: bool,
}

impl SanitizeArgs {
    /// Validate flag combinations and build the engine options.
    pub fn to_run_options(&self) -> Result<RunOptions> {
        if self.out.is_none() && !self.dry_run {
            return Err(ScrubError::configuration("--out is required unless --dry-run is set"));
        }
        let config = SanitizeConfig {
            flat: self.flat,
            overwrite: !self.no_overwrite,
            copy_unsupported: !self.no_copy_unsupported,
            dry_run: self.dry_run,
            exclude: self.exclude.clone(),
            allow_ext: self.allow_ext.clone(),
            traversal: TraversalLimits { max_files: self.max_files, max_bytes: self.max_bytes },
            zip: ZipLimits {
                max_members: self.zip_max_members,
                max_member_bytes: self.zip_max_member_bytes,
                max_total_bytes: self.zip_max_total_bytes,
                max_compression_ratio: self.zip_max_compression_ratio,
            },
            nested_policy: self.nested_archive_policy,
            nested: NestedLimits {
                max_depth: self.nested_archive_max_depth,
                max_total_bytes: self.nested_archive_max_total_bytes,
            },
            risky_policy: self.risky_policy,
            fail_on_warnings: self.fail_on_warnings,
            report_summary: self.report_summary,
            quiet: self.quiet,
        };
        config.validate()?;
        Ok(RunOptions {
            input: self.input.clone(),
            out: self.out.clone(),
            report: self.report.clone(),
            config,
        })
    }
}
