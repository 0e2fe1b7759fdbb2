//! Fixture builders shared by the integration tests. Everything is generated
//! in-memory so the suite carries no binary test data.

#![allow(dead_code)]

use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use lopdf::{dictionary, Document, Object};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// A small JPEG with a spliced-in APP1 EXIF segment whose payload carries a
/// recognizable marker string. Decoders skip the segment; the sanitizer must
/// not reproduce it.
pub fn jpeg_with_exif(secret: &str) -> Vec<u8> {
    let img = ImageBuffer::from_fn(16, 16, |x, y| Rgb([x as u8 * 10, y as u8 * 10, 64u8]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Jpeg).unwrap();
    let plain = buf.into_inner();
    assert_eq!(&plain[..2], &[0xFF, 0xD8]);

    // APP1 payload: Exif header + an empty little-endian TIFF + the marker.
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Exif\0\0");
    payload.extend_from_slice(b"II*\0\x08\0\0\0"); // TIFF header, IFD at offset 8
    payload.extend_from_slice(&[0, 0]); // zero IFD entries
    payload.extend_from_slice(&[0, 0, 0, 0]); // no next IFD
    payload.extend_from_slice(secret.as_bytes());

    let mut out = Vec::with_capacity(plain.len() + payload.len() + 4);
    out.extend_from_slice(&plain[..2]);
    out.extend_from_slice(&[0xFF, 0xE1]);
    let seg_len = (payload.len() + 2) as u16;
    out.extend_from_slice(&seg_len.to_be_bytes());
    out.extend_from_slice(&payload);
    out.extend_from_slice(&plain[2..]);
    out
}

/// A PNG with a `tEXt` chunk spliced in before `IEND`.
pub fn png_with_text(secret: &str) -> Vec<u8> {
    let img = ImageBuffer::from_fn(8, 8, |x, y| Rgb([x as u8 * 30, y as u8 * 30, 0u8]));
    let mut buf = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img).write_to(&mut buf, ImageFormat::Png).unwrap();
    let plain = buf.into_inner();

    // IEND is always the final 12 bytes.
    let iend_at = plain.len() - 12;
    let mut payload = Vec::new();
    payload.extend_from_slice(b"Comment\0");
    payload.extend_from_slice(secret.as_bytes());

    let mut chunk = Vec::new();
    chunk.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    chunk.extend_from_slice(b"tEXt");
    chunk.extend_from_slice(&payload);
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(b"tEXt");
    hasher.update(&payload);
    chunk.extend_from_slice(&hasher.finalize().to_be_bytes());

    let mut out = Vec::with_capacity(plain.len() + chunk.len());
    out.extend_from_slice(&plain[..iend_at]);
    out.extend_from_slice(&chunk);
    out.extend_from_slice(&plain[iend_at..]);
    out
}

/// The chunk type names of a PNG, in order.
pub fn png_chunk_names(bytes: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    let mut at = 8;
    while at + 8 <= bytes.len() {
        let len = u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]]);
        let name = String::from_utf8_lossy(&bytes[at + 4..at + 8]).to_string();
        names.push(name.clone());
        at += 12 + len as usize;
        if name == "IEND" {
            break;
        }
    }
    names
}

/// A one-page PDF with an `/Info` dictionary, and optionally an
/// `/OpenAction` JavaScript action on the catalog.
pub fn pdf_with_info(author: &str, open_action: bool) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![page_id.into()],
            "Count" => 1,
        }),
    );
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if open_action {
        let action_id = doc.add_object(dictionary! {
            "S" => "JavaScript",
            "JS" => Object::string_literal("app.alert('hi')"),
        });
        catalog.set("OpenAction", action_id);
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    let info_id = doc.add_object(dictionary! {
        "Author" => Object::string_literal(author),
        "Producer" => Object::string_literal("fixture"),
    });
    doc.trailer.set("Info", info_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// Byte-patch a member name in a finished ZIP (same length only). The writer
/// refuses hostile names, so adversarial fixtures are built with placeholders
/// and renamed here; local header and central directory both carry the name.
pub fn rename_zip_member(mut bytes: Vec<u8>, from: &str, to: &str) -> Vec<u8> {
    assert_eq!(from.len(), to.len());
    let (from, to) = (from.as_bytes(), to.as_bytes());
    let mut at = 0;
    while at + from.len() <= bytes.len() {
        if &bytes[at..at + from.len()] == from {
            bytes[at..at + from.len()].copy_from_slice(to);
            at += from.len();
        } else {
            at += 1;
        }
    }
    bytes
}

/// Build a ZIP from (name, bytes) pairs.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in entries {
        writer.start_file(*name, SimpleFileOptions::default()).unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Member names of a ZIP on disk or in memory.
pub fn zip_member_names(bytes: &[u8]) -> Vec<String> {
    let archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    archive.file_names().map(str::to_string).collect()
}

/// Read one member out of a ZIP.
pub fn zip_member(bytes: &[u8], name: &str) -> Vec<u8> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
    let mut member = archive.by_name(name).unwrap();
    let mut data = Vec::new();
    std::io::Read::read_to_end(&mut member, &mut data).unwrap();
    data
}

/// A macro-enabled Word package: content types, document properties, a body
/// part and a VBA project.
pub fn docm_package() -> Vec<u8> {
    build_zip(&[
        ("[Content_Types].xml", b"<Types/>"),
        ("docProps/core.xml", b"<coreProperties><creator>leaky author</creator></coreProperties>"),
        ("docProps/app.xml", b"<Properties/>"),
        ("word/document.xml", b"<document>body text</document>"),
        ("word/vbaProject.bin", b"\xd0\xcf\x11\xe0macros"),
    ])
}

/// Parse a JSONL report file into values.
pub fn read_report(path: &std::path::Path) -> Vec<serde_json::Value> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// The warning codes of one record.
pub fn warning_codes(record: &serde_json::Value) -> Vec<String> {
    record["warnings"]
        .as_array()
        .unwrap()
        .iter()
        .map(|w| w["code"].as_str().unwrap().to_string())
        .collect()
}
