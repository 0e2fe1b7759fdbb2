//! Library-level checks of the report contract: one record per input,
//! byte-lexicographic ordering, idempotent outputs, metadata-free results.

mod common;

use common::*;
use lopdf::Document;
use scrub::{run, RunOptions, SanitizeConfig};
use std::path::Path;
use tempfile::TempDir;

fn options(input: &Path, out: &Path, report: &Path) -> RunOptions {
    RunOptions {
        input: input.to_path_buf(),
        out: Some(out.to_path_buf()),
        report: report.to_string_lossy().to_string(),
        config: SanitizeConfig { quiet: true, ..SanitizeConfig::default() },
    }
}

#[test]
fn one_record_per_input_in_byte_order() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    std::fs::create_dir_all(input.join("deep/nested")).unwrap();
    std::fs::write(input.join("z.txt"), b"z").unwrap();
    std::fs::write(input.join("a.jpg"), jpeg_with_exif("x")).unwrap();
    std::fs::write(input.join("deep/nested/file.png"), png_with_text("y")).unwrap();
    std::fs::write(input.join("deep.txt"), b"d").unwrap();
    let report = tmp.path().join("report.jsonl");

    run(&options(&input, &tmp.path().join("out"), &report)).unwrap();

    let records = read_report(&report);
    assert_eq!(records.len(), 4);
    let paths: Vec<&str> = records.iter().map(|r| r["input_path"].as_str().unwrap()).collect();
    let mut sorted = paths.clone();
    sorted.sort();
    assert_eq!(paths, sorted, "records must be byte-lexicographic by input path");
}

#[test]
fn sanitized_image_output_is_a_fixed_point() {
    let tmp = TempDir::new().unwrap();
    let first_in = tmp.path().join("photo.jpg");
    std::fs::write(&first_in, jpeg_with_exif("secret")).unwrap();
    let out1 = tmp.path().join("pass1");
    let report = tmp.path().join("r1.jsonl");
    run(&options(&first_in, &out1, &report)).unwrap();

    let out2 = tmp.path().join("pass2");
    let report2 = tmp.path().join("r2.jsonl");
    run(&options(&out1.join("photo.jpg"), &out2, &report2)).unwrap();

    let pass1 = std::fs::read(out1.join("photo.jpg")).unwrap();
    let pass2 = std::fs::read(out2.join("photo.jpg")).unwrap();
    assert_eq!(pass1, pass2, "re-sanitizing a sanitized image must be byte-identical");
}

#[test]
fn sanitized_pdf_has_no_info_and_no_xmp() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("doc.pdf");
    std::fs::write(&input, pdf_with_info("Bob", false)).unwrap();
    let out = tmp.path().join("out");
    let report = tmp.path().join("report.jsonl");
    run(&options(&input, &out, &report)).unwrap();

    let sanitized = Document::load(out.join("doc.pdf")).unwrap();
    assert!(sanitized.trailer.get(b"Info").is_err(), "no /Info dictionary may remain");
    let root_id = sanitized.trailer.get(b"Root").unwrap().as_reference().unwrap();
    let catalog = sanitized.get_object(root_id).unwrap().as_dict().unwrap();
    assert!(!catalog.has(b"Metadata"), "no XMP metadata stream may remain");
}

#[test]
fn sanitized_png_contains_only_rendering_chunks() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("pic.png");
    std::fs::write(&input, png_with_text("hidden comment")).unwrap();
    let out = tmp.path().join("out");
    let report = tmp.path().join("report.jsonl");
    run(&options(&input, &out, &report)).unwrap();

    let sanitized = std::fs::read(out.join("pic.png")).unwrap();
    let names = png_chunk_names(&sanitized);
    for name in &names {
        assert!(
            ["IHDR", "PLTE", "IDAT", "tRNS", "IEND"].contains(&name.as_str()),
            "unexpected chunk {name} in sanitized png"
        );
    }
}

#[test]
fn sanitized_ooxml_has_no_doc_props() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("memo.docm");
    std::fs::write(&input, docm_package()).unwrap();
    let out = tmp.path().join("out");
    let report = tmp.path().join("report.jsonl");
    run(&options(&input, &out, &report)).unwrap();

    let names = zip_member_names(&std::fs::read(out.join("memo.docm")).unwrap());
    assert!(names.iter().all(|n| !n.starts_with("docProps/")));
}

#[test]
fn identical_runs_yield_identical_reports() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("a.jpg"), jpeg_with_exif("x")).unwrap();
    std::fs::write(input.join("bundle.zip"), build_zip(&[("t.txt", b"text")])).unwrap();
    std::fs::write(input.join("doc.pdf"), pdf_with_info("Bob", true)).unwrap();

    let mut bodies = Vec::new();
    for tag in ["one", "two"] {
        let report = tmp.path().join(format!("{tag}.jsonl"));
        let out = tmp.path().join(format!("out-{tag}"));
        run(&options(&input, &out, &report)).unwrap();
        let body =
            std::fs::read_to_string(&report).unwrap().replace(&format!("out-{tag}"), "out");
        bodies.push(body);
    }
    assert_eq!(bodies[0], bodies[1]);
}

#[test]
fn report_file_inside_the_input_tree_is_not_consumed() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("a.txt"), b"data").unwrap();
    // The report lives inside the tree being sanitized.
    let report = input.join("report.jsonl");

    run(&options(&input, &tmp.path().join("out"), &report)).unwrap();

    let records = read_report(&report);
    assert_eq!(records.len(), 1);
    assert!(records[0]["input_path"].as_str().unwrap().ends_with("a.txt"));
}

#[test]
fn out_dir_under_input_is_not_reconsumed() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in");
    std::fs::create_dir_all(&input).unwrap();
    std::fs::write(input.join("a.jpg"), jpeg_with_exif("x")).unwrap();
    let out = input.join("clean");
    std::fs::create_dir_all(&out).unwrap();
    // Leftover from a previous run.
    std::fs::write(out.join("stale.jpg"), jpeg_with_exif("y")).unwrap();
    let report = tmp.path().join("report.jsonl");

    run(&options(&input, &out, &report)).unwrap();

    let records = read_report(&report);
    assert_eq!(records.len(), 1, "only the real input is processed");
    assert!(records[0]["input_path"].as_str().unwrap().ends_with("a.jpg"));
}
