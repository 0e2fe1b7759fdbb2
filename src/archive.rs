//! Hardened ZIP sanitization.
//!
//! Members are vetted on central-directory metadata before a single byte is
//! decompressed: unsafe paths, symlinks, encrypted entries, duplicates and
//! guardrail violations are dropped with a warning and the archive continues.
//! Surviving members are read through a hard-capped reader (declared sizes
//! are never trusted), re-classified by magic, sanitized per format, and
//! written to a new archive in byte-lexicographic name order. Nested archives
//! follow a policy: skip, copy, or bounded recursive sanitization.

use crate::classify::{self, ContentType};
use crate::config::{NestedArchivePolicy, SanitizeConfig};
use crate::error::{Result, ScrubError};
use crate::fsutil::AtomicFile;
use crate::image_san;
use crate::office;
use crate::pdf;
use crate::report::{Warning, WarningCode};
use std::collections::HashSet;
use std::fs::File;
use std::io::{Cursor, Read, Seek, Write};
use std::path::Path;
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Central-directory view of one member; everything hardening needs without
/// touching compressed data.
struct MemberMeta {
    index: usize,
    raw_name: String,
    name: String,
    size: u64,
    compressed_size: u64,
    encrypted: bool,
    is_dir: bool,
    unix_mode: Option<u32>,
    compression: CompressionMethod,
    modified: Option<zip::DateTime>,
}

fn member_metadata<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Vec<MemberMeta>> {
    let mut members = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index).map_err(|e| {
            ScrubError::archive(format!("failed to read central directory entry {index}: {e}"))
        })?;
        members.push(MemberMeta {
            index,
            raw_name: entry.name().to_string(),
            name: entry.name().replace('\\', "/"),
            size: entry.size(),
            compressed_size: entry.compressed_size(),
            encrypted: entry.encrypted(),
            is_dir: entry.is_dir(),
            unix_mode: entry.unix_mode(),
            compression: entry.compression(),
            modified: entry.last_modified(),
        });
    }
    // Byte-lexicographic processing order makes reports reproducible.
    members.sort_by(|a, b| a.name.as_bytes().cmp(b.name.as_bytes()));
    Ok(members)
}

/// A name that could land outside the extraction root, or that we refuse to
/// reproduce: absolute, drive-prefixed, traversing, or empty.
fn is_unsafe_name(name: &str) -> bool {
    if name.is_empty() || name.starts_with('/') {
        return true;
    }
    let mut components = name.split('/');
    if components.next().is_some_and(|first| first.ends_with(':')) {
        return true;
    }
    name.split('/').any(|component| component == "..")
}

fn is_symlink(unix_mode: Option<u32>) -> bool {
    unix_mode.is_some_and(|mode| mode & 0o170000 == 0o120000)
}

/// Read one member through a cap. `Ok(None)` means the stream outgrew the cap
/// (the header lied); partial bytes are discarded.
fn read_member_bounded<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    index: usize,
    cap: u64,
) -> Result<Option<Vec<u8>>> {
    let mut entry = archive
        .by_index(index)
        .map_err(|e| ScrubError::archive(format!("failed to open member: {e}")))?;
    let mut data = Vec::new();
    let mut limited = (&mut entry).take(cap.saturating_add(1));
    limited
        .read_to_end(&mut data)
        .map_err(|e| ScrubError::archive(format!("failed to decompress member: {e}")))?;
    if data.len() as u64 > cap {
        return Ok(None);
    }
    Ok(Some(data))
}

fn write_member<W: Write + Seek>(
    writer: &mut ZipWriter<W>,
    member: &MemberMeta,
    payload: &[u8],
) -> Result<()> {
    // Sanitized payloads change size, so only the compression method carries
    // over; anything exotic downgrades to Deflated.
    let method = match member.compression {
        CompressionMethod::Stored => CompressionMethod::Stored,
        _ => CompressionMethod::Deflated,
    };
    let mut options = SimpleFileOptions::default().compression_method(method);
    if let Some(modified) = member.modified {
        options = options.last_modified_time(modified);
    }
    if let Some(mode) = member.unix_mode {
        options = options.unix_permissions(mode);
    }
    writer
        .start_file(member.name.as_str(), options)
        .map_err(|e| ScrubError::archive(format!("failed to start member: {e}")))?;
    writer.write_all(payload)?;
    Ok(())
}

/// Recursively sanitize a nested archive held in memory. The caller has
/// already charged the container bytes against the nested budget.
fn sanitize_nested(
    data: &[u8],
    config: &SanitizeConfig,
    depth: u64,
    nested_read: &mut u64,
) -> Result<(Vec<u8>, Vec<Warning>)> {
    let mut inner = ZipArchive::new(Cursor::new(data))
        .map_err(|e| ScrubError::archive(format!("failed to open nested archive: {e}")))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let warnings = sanitize_members(&mut inner, Some(&mut writer), config, depth, nested_read)?;
    let cursor = writer
        .finish()
        .map_err(|e| ScrubError::archive(format!("failed to finish nested archive: {e}")))?;
    Ok((cursor.into_inner(), warnings))
}

fn sanitize_members<R: Read + Seek, W: Write + Seek>(
    archive: &mut ZipArchive<R>,
    mut writer: Option<&mut ZipWriter<W>>,
    config: &SanitizeConfig,
    depth: u64,
    nested_read: &mut u64,
) -> Result<Vec<Warning>> {
    let members = member_metadata(archive)?;
    let mut warnings: Vec<Warning> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut kept: u64 = 0;
    let mut total_read: u64 = 0;

    for member in &members {
        let member_display = member.raw_name.as_str();

        if is_unsafe_name(&member.name) {
            warnings.push(Warning::new(
                WarningCode::ZipUnsafePath,
                format!("zip entry '{member_display}' has an unsafe path; skipped"),
            ));
            continue;
        }
        if is_symlink(member.unix_mode) {
            warnings.push(Warning::new(
                WarningCode::ZipSymlinkSkipped,
                format!("zip entry '{member_display}' is a symlink; skipped"),
            ));
            continue;
        }
        if member.encrypted {
            warnings.push(Warning::new(
                WarningCode::ZipEncryptedSkipped,
                format!("zip entry '{member_display}' is encrypted; skipped"),
            ));
            continue;
        }
        if !seen.insert(member.name.clone()) {
            warnings.push(Warning::new(
                WarningCode::ZipDuplicateSkipped,
                format!("zip entry '{member_display}' is duplicated; skipped"),
            ));
            continue;
        }
        if member.is_dir {
            if let Some(w) = writer.as_deref_mut() {
                w.add_directory(member.name.trim_end_matches('/'), SimpleFileOptions::default())
                    .map_err(|e| ScrubError::archive(format!("failed to add directory: {e}")))?;
            }
            continue;
        }

        // Guardrails, still metadata-only.
        if kept >= config.zip.max_members {
            warnings.push(Warning::new(
                WarningCode::ZipTooManyMembers,
                format!(
                    "zip entry '{member_display}' exceeds the {}-member limit; skipped",
                    config.zip.max_members
                ),
            ));
            continue;
        }
        if member.size > config.zip.max_member_bytes {
            warnings.push(Warning::new(
                WarningCode::ZipMemberTooLarge,
                format!(
                    "zip entry '{member_display}' declares {} bytes, over the {}-byte member limit; skipped",
                    member.size, config.zip.max_member_bytes
                ),
            ));
            continue;
        }
        let ratio = member.size / member.compressed_size.max(1);
        if ratio > config.zip.max_compression_ratio {
            warnings.push(Warning::new(
                WarningCode::ZipRatioExceeded,
                format!(
                    "zip entry '{member_display}' compression ratio {ratio} exceeds limit {}; skipped",
                    config.zip.max_compression_ratio
                ),
            ));
            continue;
        }
        if total_read.saturating_add(member.size) > config.zip.max_total_bytes {
            warnings.push(Warning::new(
                WarningCode::ZipTotalBytesExceeded,
                format!(
                    "zip entry '{member_display}' would exceed the {}-byte archive total; skipped",
                    config.zip.max_total_bytes
                ),
            ));
            continue;
        }
        kept += 1;

        let data = match read_member_bounded(archive, member.index, config.zip.max_member_bytes) {
            Ok(Some(data)) => data,
            Ok(None) => {
                warnings.push(Warning::new(
                    WarningCode::ZipMemberTooLarge,
                    format!(
                        "zip entry '{member_display}' outgrew its declared size past the {}-byte member limit; skipped",
                        config.zip.max_member_bytes
                    ),
                ));
                continue;
            }
            Err(e) => {
                // A corrupt stream is local to this member.
                warnings.push(Warning::new(
                    WarningCode::ZipMemberSanitizeFailed,
                    format!("zip entry '{member_display}' failed to read: {e}; skipped"),
                ));
                continue;
            }
        };
        if total_read.saturating_add(data.len() as u64) > config.zip.max_total_bytes {
            warnings.push(Warning::new(
                WarningCode::ZipTotalBytesExceeded,
                format!(
                    "zip entry '{member_display}' would exceed the {}-byte archive total; skipped",
                    config.zip.max_total_bytes
                ),
            ));
            continue;
        }
        total_read += data.len() as u64;

        let detected = classify::classify_bytes(&data);
        debug!("zip member {}: {} bytes, detected {:?}", member_display, data.len(), detected);
        match detected {
            ContentType::Zip => match config.nested_policy {
                NestedArchivePolicy::Skip => {
                    warnings.push(Warning::new(
                        WarningCode::ZipNestedArchiveSkipped,
                        format!("zip entry '{member_display}' is a nested archive; skipped"),
                    ));
                }
                NestedArchivePolicy::Copy => {
                    if let Some(w) = writer.as_deref_mut() {
                        write_member(w, member, &data)?;
                    }
                    warnings.push(Warning::new(
                        WarningCode::ZipNestedArchiveCopied,
                        format!("zip entry '{member_display}' is a nested archive; copied unsanitized"),
                    ));
                }
                NestedArchivePolicy::Sanitize => {
                    let next_depth = depth + 1;
                    if next_depth > config.nested.max_depth {
                        warnings.push(Warning::new(
                            WarningCode::ZipNestedArchiveFailed,
                            format!(
                                "zip entry '{member_display}' nests deeper than {}; skipped",
                                config.nested.max_depth
                            ),
                        ));
                        continue;
                    }
                    if nested_read.saturating_add(data.len() as u64) > config.nested.max_total_bytes
                    {
                        warnings.push(Warning::new(
                            WarningCode::ZipNestedArchiveFailed,
                            format!(
                                "zip entry '{member_display}' would exceed the {}-byte nested budget; skipped",
                                config.nested.max_total_bytes
                            ),
                        ));
                        continue;
                    }
                    *nested_read = nested_read.saturating_add(data.len() as u64);
                    match sanitize_nested(&data, config, next_depth, nested_read) {
                        Ok((bytes, inner_warnings)) => {
                            warnings
                                .extend(inner_warnings.iter().map(|w| w.for_member(&member.name)));
                            if let Some(w) = writer.as_deref_mut() {
                                write_member(w, member, &bytes)?;
                            }
                            warnings.push(Warning::new(
                                WarningCode::ZipNestedArchiveSanitized,
                                format!("zip entry '{member_display}' sanitized recursively"),
                            ));
                        }
                        Err(e) => {
                            warnings.push(Warning::new(
                                WarningCode::ZipNestedArchiveFailed,
                                format!("zip entry '{member_display}' failed to sanitize: {e}; skipped"),
                            ));
                        }
                    }
                }
            },
            ContentType::Jpeg | ContentType::Png | ContentType::WebP | ContentType::Tiff => {
                let result = if writer.is_some() {
                    image_san::sanitize_image(&data, detected).map(Some)
                } else {
                    image_san::validate_image(&data, detected).map(|()| None)
                };
                match result {
                    Ok(bytes) => {
                        if let (Some(w), Some(bytes)) = (writer.as_deref_mut(), bytes) {
                            write_member(w, member, &bytes)?;
                        }
                    }
                    Err(e) => {
                        warnings.push(Warning::new(
                            WarningCode::ZipMemberSanitizeFailed,
                            format!("zip entry '{member_display}' failed to sanitize: {e}; skipped"),
                        ));
                    }
                }
            }
            ContentType::Pdf => {
                if let Some(w) = writer.as_deref_mut() {
                    match pdf::sanitize_pdf(&data) {
                        Ok(outcome) => {
                            warnings.extend(
                                outcome.warnings.iter().map(|wn| wn.for_member(&member.name)),
                            );
                            write_member(w, member, &outcome.bytes)?;
                        }
                        Err(e) => {
                            warnings.push(Warning::new(
                                WarningCode::PdfScanFailed,
                                format!("zip entry '{member_display}' failed to parse as PDF: {e}; skipped"),
                            ));
                        }
                    }
                } else {
                    match pdf::scan_pdf(&data) {
                        Ok(inner) => warnings
                            .extend(inner.iter().map(|wn| wn.for_member(&member.name))),
                        Err(e) => {
                            warnings.push(Warning::new(
                                WarningCode::PdfScanFailed,
                                format!("zip entry '{member_display}' failed to parse as PDF: {e}; skipped"),
                            ));
                        }
                    }
                }
            }
            ContentType::Ooxml => {
                let ext = member
                    .name
                    .rsplit('/')
                    .next()
                    .and_then(|leaf| leaf.rsplit_once('.'))
                    .map(|(_, ext)| ext.to_ascii_lowercase());
                if let Some(w) = writer.as_deref_mut() {
                    match office::sanitize_ooxml(&data, ext.as_deref()) {
                        Ok(outcome) => {
                            warnings.extend(
                                outcome.warnings.iter().map(|wn| wn.for_member(&member.name)),
                            );
                            write_member(w, member, &outcome.bytes)?;
                        }
                        Err(e) => {
                            warnings.push(Warning::new(
                                WarningCode::OfficeOoxmlScanFailed,
                                format!(
                                    "zip entry '{member_display}' failed to open as an OOXML package: {e}; skipped"
                                ),
                            ));
                        }
                    }
                } else {
                    match office::scan_ooxml(&data, ext.as_deref()) {
                        Ok(inner) => warnings
                            .extend(inner.iter().map(|wn| wn.for_member(&member.name))),
                        Err(e) => {
                            warnings.push(Warning::new(
                                WarningCode::OfficeOoxmlScanFailed,
                                format!(
                                    "zip entry '{member_display}' failed to open as an OOXML package: {e}; skipped"
                                ),
                            ));
                        }
                    }
                }
            }
            ContentType::Unknown => {
                if config.copy_unsupported {
                    if let Some(w) = writer.as_deref_mut() {
                        write_member(w, member, &data)?;
                    }
                } else {
                    warnings.push(Warning::new(
                        WarningCode::ZipUnsupportedSkipped,
                        format!("zip entry '{member_display}' has unsupported content; skipped"),
                    ));
                }
            }
        }
    }

    Ok(warnings)
}

/// Sanitize a ZIP archive on disk. With `output = None` (dry-run) the archive
/// is fully scanned and produces identical warnings, but nothing is staged.
/// Otherwise the new archive is built in a sibling temporary; the caller
/// commits or drops the returned [`AtomicFile`] after policy gating.
pub fn sanitize_zip_file(
    input: &Path,
    output: Option<&Path>,
    config: &SanitizeConfig,
) -> Result<(Vec<Warning>, Option<AtomicFile>)> {
    let file = File::open(input)?;
    let mut archive = ZipArchive::new(file).map_err(|e| {
        ScrubError::archive(format!("failed to open archive {}: {e}", input.display()))
    })?;
    let mut nested_read = 0u64;

    match output {
        None => {
            let warnings = sanitize_members(
                &mut archive,
                None::<&mut ZipWriter<Cursor<Vec<u8>>>>,
                config,
                0,
                &mut nested_read,
            )?;
            Ok((warnings, None))
        }
        Some(dest) => {
            let mut pending = AtomicFile::begin(dest)?;
            let mut writer = ZipWriter::new(pending.file());
            let warnings =
                sanitize_members(&mut archive, Some(&mut writer), config, 0, &mut nested_read)?;
            writer
                .finish()
                .map_err(|e| ScrubError::archive(format!("failed to finish archive: {e}")))?;
            Ok((warnings, Some(pending)))
        }
    }
}
