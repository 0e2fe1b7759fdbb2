//! Run orchestration.
//!
//! One invocation, one pass: the input is classified and dispatched (file,
//! archive, or directory), every unit of work produces exactly one report
//! record, and the policy gate gets the last word before any output is
//! committed. All mutable run state lives here, owned by the [`Runner`] and
//! passed explicitly; there are no globals.

use crate::archive;
use crate::classify::{self, ContentType};
use crate::config::SanitizeConfig;
use crate::error::{Result, ScrubError};
use crate::fsutil::{self, AtomicFile};
use crate::image_san;
use crate::office;
use crate::output;
use crate::pdf;
use crate::policy;
use crate::report::{Action, Record, ReportWriter, Summary, Warning, WarningCode, REPORT_VERSION};
use crate::walk::{self, ExcludeSet, WalkEvent};
use chrono::Utc;
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct RunOptions {
    /// File, directory, or archive to sanitize
    pub input: PathBuf,
    /// Output root; `None` only in dry-run
    pub out: Option<PathBuf>,
    /// Report sink path, `-` for stdout
    pub report: String,
    pub config: SanitizeConfig,
}

/// Per-invocation counters, owned by the orchestrator.
#[derive(Debug, Default)]
pub struct RunState {
    pub files_seen: u64,
    pub bytes_seen: u64,
    pub counts: BTreeMap<&'static str, u64>,
    pub warning_count: u64,
    pub error_count: u64,
    pub failures: u64,
}

impl RunState {
    fn absorb(&mut self, record: &Record) {
        *self.counts.entry(record.action.as_str()).or_insert(0) += 1;
        self.warning_count += record.warnings.len() as u64;
        if record.action == Action::Error {
            self.error_count += 1;
        }
        if record.action.is_failure() {
            self.failures += 1;
        }
    }
}

/// Final result of a run.
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: i32,
    pub state: RunState,
}

/// What a sanitizer produced for one input, pending the policy gate.
enum Staged {
    /// Nothing to write (dry-run, skip, exclusion)
    Nothing,
    /// Sanitized bytes to be written atomically
    Bytes(Vec<u8>),
    /// Raw copy of the input file
    CopySource,
    /// An archive already assembled in a sibling temporary
    Archive(AtomicFile),
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

fn resolve_lenient(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Execute one sanitization run.
pub fn run(opts: &RunOptions) -> Result<RunOutcome> {
    let started_at = Utc::now();
    opts.config.validate()?;
    if opts.out.is_none() && !opts.config.dry_run {
        return Err(ScrubError::configuration("an output root is required unless dry-run"));
    }

    let writer = ReportWriter::open(&opts.report)?;
    // The report itself must never be consumed as an input. Irrelevant in
    // stdout mode, where a file literally named `-` is an ordinary input.
    let report_path = if writer.is_stdout() {
        None
    } else {
        Path::new(&opts.report).canonicalize().ok()
    };

    let mut runner = Runner {
        opts,
        writer,
        state: RunState::default(),
        reserved: HashSet::new(),
        report_path,
    };

    let input = opts.input.as_path();
    if !input.exists() {
        let record = Record::new(display(input), Action::Error)
            .with_error(ScrubError::path_not_found(input).to_string());
        runner.emit(record)?;
    } else if input.is_dir() {
        runner.run_directory(input)?;
    } else {
        runner.state.files_seen = 1;
        runner.state.bytes_seen = input.metadata().map(|m| m.len()).unwrap_or(0);
        let rel = PathBuf::from(input.file_name().unwrap_or(input.as_os_str()));
        runner.run_file(input, &rel, false)?;
    }

    let exit_code = runner.exit_code();
    let ended_at = Utc::now();
    if opts.config.report_summary {
        let summary = Summary {
            kind: "summary",
            report_version: REPORT_VERSION,
            dry_run: opts.config.dry_run,
            exit_code,
            files: runner.state.files_seen,
            warnings: runner.state.warning_count,
            errors: runner.state.error_count,
            counts: runner.state.counts.clone(),
            tool_version: env!("CARGO_PKG_VERSION"),
            started_at,
            ended_at,
            duration_ms: (ended_at - started_at).num_milliseconds().max(0) as u64,
            input: display(input),
            out: opts.out.as_deref().map(display),
            report: opts.report.clone(),
            options: opts.config.clone(),
        };
        runner.writer.write_summary(&summary)?;
    }
    if !opts.config.quiet {
        output::print_summary(&runner.state, exit_code);
    }
    Ok(RunOutcome { exit_code, state: runner.state })
}

struct Runner<'a> {
    opts: &'a RunOptions,
    writer: ReportWriter,
    state: RunState,
    reserved: HashSet<PathBuf>,
    report_path: Option<PathBuf>,
}

impl Runner<'_> {
    fn emit(&mut self, record: Record) -> Result<()> {
        self.state.absorb(&record);
        self.writer.write_record(&record)?;
        if !self.opts.config.quiet {
            output::print_item(&record);
        }
        Ok(())
    }

    fn exit_code(&self) -> i32 {
        if self.state.failures > 0 {
            2
        } else if self.opts.config.fail_on_warnings && self.state.warning_count > 0 {
            3
        } else {
            0
        }
    }

    fn run_directory(&mut self, root: &Path) -> Result<()> {
        let config = &self.opts.config;
        let excludes = ExcludeSet::compile(&config.exclude)?;
        // Snapshot the file set before any write so outputs landing beneath
        // the input root are never re-consumed.
        let events = walk::walk_tree(root, &excludes)?;
        let root_resolved = resolve_lenient(root);
        let out_in_input = self
            .opts
            .out
            .as_ref()
            .map(|out| resolve_lenient(out))
            .filter(|out| out.starts_with(&root_resolved));

        for event in events {
            match event {
                WalkEvent::Excluded { path, pattern, .. } => {
                    let record = Record::new(display(&path), Action::Excluded).with_warnings(vec![
                        Warning::new(
                            WarningCode::ExcludedByPattern,
                            format!("excluded by pattern: {pattern}"),
                        ),
                    ]);
                    self.emit(record)?;
                }
                WalkEvent::Symlink { path, .. } => {
                    let action = self.finish_action(Action::Skipped);
                    let record = Record::new(display(&path), action).with_warnings(vec![
                        Warning::new(WarningCode::SymlinkSkipped, "symlink skipped"),
                    ]);
                    self.emit(record)?;
                }
                WalkEvent::File { path, rel, size } => {
                    if let Some(report) = &self.report_path {
                        if path.canonicalize().ok().as_deref() == Some(report) {
                            continue;
                        }
                    }
                    if let Some(out) = &out_in_input {
                        if resolve_lenient(&path).starts_with(out) {
                            continue;
                        }
                    }
                    if let Some(max) = self.opts.config.traversal.max_files {
                        if self.state.files_seen + 1 > max {
                            self.emit_truncated(root, format!("file ceiling of {max} reached"))?;
                            break;
                        }
                    }
                    if let Some(max) = self.opts.config.traversal.max_bytes {
                        if self.state.bytes_seen + size > max {
                            self.emit_truncated(root, format!("byte ceiling of {max} reached"))?;
                            break;
                        }
                    }
                    self.state.files_seen += 1;
                    self.state.bytes_seen += size;
                    self.run_file(&path, &rel, true)?;
                }
            }
        }
        Ok(())
    }

    fn emit_truncated(&mut self, root: &Path, reason: String) -> Result<()> {
        let record = Record::new(display(root), Action::Truncated)
            .with_warnings(vec![Warning::new(WarningCode::TraversalTruncated, reason)]);
        self.emit(record)
    }

    /// Process one file and emit its record.
    fn run_file(&mut self, path: &Path, rel: &Path, from_traversal: bool) -> Result<()> {
        let record = self.process_file(path, rel, from_traversal)?;
        self.emit(record)
    }

    fn finish_action(&self, action: Action) -> Action {
        if self.opts.config.dry_run {
            action.dry_run_analogue()
        } else {
            action
        }
    }

    fn process_file(&mut self, path: &Path, rel: &Path, from_traversal: bool) -> Result<Record> {
        let config = &self.opts.config;
        let input_display = display(path);
        debug!("processing {input_display}");

        let detected = match classify::classify_file(path) {
            Ok(detected) => detected,
            Err(e) => {
                return Ok(Record::new(input_display, Action::Error).with_error(e.to_string()))
            }
        };
        let extension = classify::declared_extension(path);
        let classified = classify::reconcile(detected, extension.as_deref());
        let mut warnings: Vec<Warning> = classified.warning.into_iter().collect();
        let content_type = classified.content_type;

        if from_traversal
            && !config.allow_ext.is_empty()
            && !allowlist_permits(&config.allow_ext, content_type)
        {
            warnings.push(Warning::new(
                WarningCode::AllowlistSkipped,
                format!("detected type {content_type} is not in the allowlist; skipped"),
            ));
            let action = self.finish_action(Action::Skipped);
            return Ok(Record::new(input_display, action).with_warnings(warnings));
        }

        let output_path = self.output_path_for(rel)?;
        if let Some(dest) = &output_path {
            if dest.exists() && !config.overwrite {
                warnings.push(Warning::new(
                    WarningCode::OutputExists,
                    "output exists; use --overwrite to replace",
                ));
                let action = self.finish_action(Action::Skipped);
                return Ok(Record::new(input_display, action)
                    .with_output(Some(display(dest)))
                    .with_warnings(warnings));
            }
        }

        let dispatched = self.dispatch(path, content_type, extension.as_deref(), &output_path);
        let (mut action, staged) = match dispatched {
            Ok((action, staged, mut new_warnings)) => {
                warnings.append(&mut new_warnings);
                (action, staged)
            }
            Err(e) => {
                match &e {
                    ScrubError::Pdf { .. } => warnings.push(Warning::new(
                        WarningCode::PdfScanFailed,
                        format!("failed to parse PDF: {e}"),
                    )),
                    ScrubError::Office { .. } => warnings.push(Warning::new(
                        WarningCode::OfficeOoxmlScanFailed,
                        format!("failed to open OOXML package: {e}"),
                    )),
                    _ => {}
                }
                return Ok(Record::new(input_display, Action::Error)
                    .with_warnings(warnings)
                    .with_error(e.to_string()));
            }
        };

        // The policy gate is the one place warnings can void an output.
        let mut record_output = match (&staged, action) {
            (_, Action::Skipped) => None,
            _ => output_path.as_deref().map(display),
        };
        let mut staged = staged;
        if action != Action::Error && policy::should_block(config.risky_policy, &warnings) {
            action = Action::Blocked;
            staged = Staged::Nothing; // dropping a staged archive discards its temporary
            record_output = None;
        }
        let action = self.finish_action(action);

        if !config.dry_run {
            let written = match staged {
                Staged::Nothing => Ok(()),
                Staged::Bytes(bytes) => match &output_path {
                    Some(dest) => fsutil::write_atomic(dest, &bytes),
                    None => Ok(()),
                },
                Staged::CopySource => match &output_path {
                    Some(dest) => fsutil::copy_atomic(path, dest),
                    None => Ok(()),
                },
                Staged::Archive(pending) => pending.commit(),
            };
            if let Err(e) = written {
                return Ok(Record::new(input_display, Action::Error)
                    .with_warnings(warnings)
                    .with_error(e.to_string()));
            }
        }

        Ok(Record::new(input_display, action).with_output(record_output).with_warnings(warnings))
    }

    /// Route one classified file to its sanitizer. Returns the action, the
    /// staged output, and any warnings the sanitizer produced.
    fn dispatch(
        &self,
        path: &Path,
        content_type: ContentType,
        extension: Option<&str>,
        output_path: &Option<PathBuf>,
    ) -> Result<(Action, Staged, Vec<Warning>)> {
        let config = &self.opts.config;
        match content_type {
            ContentType::Jpeg | ContentType::Png | ContentType::WebP | ContentType::Tiff => {
                let bytes = std::fs::read(path)?;
                if config.dry_run {
                    image_san::validate_image(&bytes, content_type)?;
                    Ok((Action::ImageSanitized, Staged::Nothing, Vec::new()))
                } else {
                    let sanitized = image_san::sanitize_image(&bytes, content_type)?;
                    Ok((Action::ImageSanitized, Staged::Bytes(sanitized), Vec::new()))
                }
            }
            ContentType::Pdf => {
                let bytes = std::fs::read(path)?;
                if config.dry_run {
                    let warnings = pdf::scan_pdf(&bytes)?;
                    Ok((Action::PdfSanitized, Staged::Nothing, warnings))
                } else {
                    let outcome = pdf::sanitize_pdf(&bytes)?;
                    Ok((Action::PdfSanitized, Staged::Bytes(outcome.bytes), outcome.warnings))
                }
            }
            ContentType::Ooxml => {
                let bytes = std::fs::read(path)?;
                if config.dry_run {
                    let warnings = office::scan_ooxml(&bytes, extension)?;
                    Ok((Action::OfficeSanitized, Staged::Nothing, warnings))
                } else {
                    let outcome = office::sanitize_ooxml(&bytes, extension)?;
                    Ok((Action::OfficeSanitized, Staged::Bytes(outcome.bytes), outcome.warnings))
                }
            }
            ContentType::Zip => {
                let dest = if config.dry_run { None } else { output_path.as_deref() };
                let (warnings, pending) = archive::sanitize_zip_file(path, dest, config)?;
                let staged = match pending {
                    Some(pending) => Staged::Archive(pending),
                    None => Staged::Nothing,
                };
                Ok((Action::ZipSanitized, staged, warnings))
            }
            ContentType::Unknown => {
                if config.copy_unsupported {
                    Ok((Action::Copied, Staged::CopySource, Vec::new()))
                } else {
                    let warning =
                        Warning::new(WarningCode::UnsupportedSkipped, "unsupported file type; skipped");
                    Ok((Action::Skipped, Staged::Nothing, vec![warning]))
                }
            }
        }
    }

    /// Mirror the input tree under the output root, or flatten with numeric
    /// collision counters. `None` when no output root is set (dry-run).
    fn output_path_for(&mut self, rel: &Path) -> Result<Option<PathBuf>> {
        let Some(out) = self.opts.out.as_ref() else {
            return Ok(None);
        };
        if !self.opts.config.flat {
            return Ok(Some(out.join(rel)));
        }

        let name = rel.file_name().unwrap_or(rel.as_os_str());
        let candidate = out.join(name);
        if !candidate.exists() && self.reserved.insert(candidate.clone()) {
            return Ok(Some(candidate));
        }

        let stem = candidate.file_stem().map(|s| s.to_string_lossy().to_string()).unwrap_or_default();
        let suffix = candidate
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();
        for counter in 1..10_000u32 {
            let alternate = out.join(format!("{stem}-{counter}{suffix}"));
            if !alternate.exists() && self.reserved.insert(alternate.clone()) {
                return Ok(Some(alternate));
            }
        }
        Err(ScrubError::output_write(format!(
            "unable to find an available output name for {}",
            rel.display()
        )))
    }
}

fn allowlist_permits(allow_ext: &[String], content_type: ContentType) -> bool {
    let permitted = content_type.extensions();
    allow_ext.iter().any(|entry| {
        let entry = entry.trim_start_matches('.').to_ascii_lowercase();
        permitted.contains(&entry.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RiskyPolicy;
    use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
    use std::io::Cursor;

    fn jpeg_bytes() -> Vec<u8> {
        let img = ImageBuffer::from_fn(8, 8, |x, y| Rgb([x as u8, y as u8, 0u8]));
        let mut buf = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Jpeg).unwrap();
        buf.into_inner()
    }

    fn read_report(path: &Path) -> Vec<serde_json::Value> {
        std::fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn options(input: &Path, out: &Path, report: &Path) -> RunOptions {
        RunOptions {
            input: input.to_path_buf(),
            out: Some(out.to_path_buf()),
            report: report.to_string_lossy().to_string(),
            config: SanitizeConfig { quiet: true, ..SanitizeConfig::default() },
        }
    }

    #[test]
    fn directory_records_are_ordered_and_counted() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(input.join("sub")).unwrap();
        std::fs::write(input.join("b.txt"), b"b").unwrap();
        std::fs::write(input.join("a.jpg"), jpeg_bytes()).unwrap();
        std::fs::write(input.join("sub/c.txt"), b"c").unwrap();
        let report = dir.path().join("report.jsonl");
        let opts = options(&input, &dir.path().join("out"), &report);

        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 0);
        let records = read_report(&report);
        let inputs: Vec<&str> =
            records.iter().map(|r| r["input_path"].as_str().unwrap()).collect();
        let mut sorted = inputs.clone();
        sorted.sort();
        assert_eq!(inputs, sorted);
        assert_eq!(records.len(), 3);
        assert!(dir.path().join("out/a.jpg").exists());
        assert!(dir.path().join("out/sub/c.txt").exists());
    }

    #[test]
    fn max_files_ceiling_truncates() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        for name in ["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"] {
            std::fs::write(input.join(name), b"data").unwrap();
        }
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &dir.path().join("out"), &report);
        opts.config.traversal.max_files = Some(2);

        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 0);
        let records = read_report(&report);
        assert_eq!(records.len(), 3);
        assert_eq!(records[2]["action"], "truncated");
        assert_eq!(records[2]["warnings"][0]["code"], "traversal_truncated");
        assert_eq!(outcome.state.files_seen, 2);
    }

    #[test]
    fn dry_run_writes_nothing_and_renames_actions() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.jpg"), jpeg_bytes()).unwrap();
        std::fs::write(input.join("b.txt"), b"text").unwrap();
        let out = dir.path().join("out");
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &out, &report);
        opts.config.dry_run = true;

        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 0);
        assert!(!out.exists());
        let records = read_report(&report);
        assert_eq!(records[0]["action"], "would_image_sanitize");
        assert_eq!(records[1]["action"], "would_copy");
    }

    #[test]
    fn blocked_records_produce_no_output_and_exit_2() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        // A macro-enabled package triggers the risky set.
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        use std::io::Write as _;
        writer.start_file("[Content_Types].xml", zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.start_file("docProps/core.xml", zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<coreProperties/>").unwrap();
        writer.start_file("word/vbaProject.bin", zip::write::SimpleFileOptions::default()).unwrap();
        writer.write_all(b"\xd0\xcf\x11\xe0").unwrap();
        let package = writer.finish().unwrap().into_inner();
        std::fs::write(input.join("doc.docm"), package).unwrap();

        let out = dir.path().join("out");
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &out, &report);
        opts.config.risky_policy = RiskyPolicy::Block;

        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 2);
        let records = read_report(&report);
        assert_eq!(records[0]["action"], "blocked");
        assert!(records[0]["output_path"].is_null());
        assert!(!out.join("doc.docm").exists());
    }

    #[test]
    fn flat_mode_disambiguates_collisions_numerically() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(input.join("x")).unwrap();
        std::fs::create_dir_all(input.join("y")).unwrap();
        std::fs::write(input.join("x/same.txt"), b"one").unwrap();
        std::fs::write(input.join("y/same.txt"), b"two").unwrap();
        let out = dir.path().join("out");
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &out, &report);
        opts.config.flat = true;

        run(&opts).unwrap();
        assert!(out.join("same.txt").exists());
        assert!(out.join("same-1.txt").exists());
    }

    #[test]
    fn no_overwrite_skips_existing_outputs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.txt"), b"new").unwrap();
        let out = dir.path().join("out");
        std::fs::create_dir_all(&out).unwrap();
        std::fs::write(out.join("a.txt"), b"old").unwrap();
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &out, &report);
        opts.config.overwrite = false;

        run(&opts).unwrap();
        let records = read_report(&report);
        assert_eq!(records[0]["action"], "skipped");
        assert_eq!(records[0]["warnings"][0]["code"], "output_exists");
        assert_eq!(std::fs::read(out.join("a.txt")).unwrap(), b"old");
    }

    #[test]
    fn allowlist_filters_on_detected_type() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        // A JPEG renamed .dat still passes a .jpg allowlist.
        std::fs::write(input.join("photo.dat"), jpeg_bytes()).unwrap();
        std::fs::write(input.join("notes.txt"), b"text").unwrap();
        let out = dir.path().join("out");
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &out, &report);
        opts.config.allow_ext = vec![".jpg".to_string()];

        run(&opts).unwrap();
        let records = read_report(&report);
        assert_eq!(records[0]["action"], "skipped");
        assert_eq!(records[0]["warnings"][0]["code"], "allowlist_skipped");
        assert_eq!(records[1]["action"], "image_sanitized");
    }

    #[test]
    fn fail_on_warnings_bumps_exit_to_3_but_not_past_2() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        // Renamed file produces a content_type_detected warning.
        std::fs::write(input.join("photo.txt"), jpeg_bytes()).unwrap();
        let report = dir.path().join("report.jsonl");
        let mut opts = options(&input, &dir.path().join("out"), &report);
        opts.config.fail_on_warnings = true;

        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 3);
    }

    #[test]
    fn missing_input_is_an_error_record_with_exit_2() {
        let dir = tempfile::tempdir().unwrap();
        let report = dir.path().join("report.jsonl");
        let opts = options(&dir.path().join("nope.bin"), &dir.path().join("out"), &report);
        let outcome = run(&opts).unwrap();
        assert_eq!(outcome.exit_code, 2);
        let records = read_report(&report);
        assert_eq!(records[0]["action"], "error");
        assert!(records[0]["error"].as_str().unwrap().contains("does not exist"));
    }

    #[test]
    fn two_runs_produce_identical_reports() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in");
        std::fs::create_dir_all(&input).unwrap();
        std::fs::write(input.join("a.jpg"), jpeg_bytes()).unwrap();
        std::fs::write(input.join("b.txt"), b"text").unwrap();

        let mut reports = Vec::new();
        for tag in ["r1", "r2"] {
            let report = dir.path().join(format!("{tag}.jsonl"));
            let opts = options(&input, &dir.path().join(format!("out-{tag}")), &report);
            run(&opts).unwrap();
            let body = std::fs::read_to_string(&report)
                .unwrap()
                .replace(&format!("out-{tag}"), "out");
            reports.push(body);
        }
        assert_eq!(reports[0], reports[1]);
    }
}
