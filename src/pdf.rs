//! PDF metadata removal and active-content scanning.
//!
//! Sanitization strips the document-info dictionary (`/Info`) and the XMP
//! metadata stream referenced from the catalog. Active content is a different
//! story: actions, JavaScript, forms and embedded files are *reported*, never
//! rewritten, because removing them silently changes document behavior.

use crate::error::{Result, ScrubError};
use crate::report::{Warning, WarningCode};
use lopdf::{Document, Object};

/// Result of sanitizing one PDF: the rewritten bytes plus risk warnings.
pub struct PdfOutcome {
    pub bytes: Vec<u8>,
    pub warnings: Vec<Warning>,
}

/// Parse and risk-scan without producing output (dry-run path).
pub fn scan_pdf(bytes: &[u8]) -> Result<Vec<Warning>> {
    let doc = load(bytes)?;
    Ok(scan_risks(&doc))
}

/// Strip `/Info` and the catalog XMP `/Metadata` stream, keeping pages
/// untouched, and report active-content indicators.
pub fn sanitize_pdf(bytes: &[u8]) -> Result<PdfOutcome> {
    let mut doc = load(bytes)?;
    let warnings = scan_risks(&doc);

    strip_document_info(&mut doc);
    strip_xmp_metadata(&mut doc);

    let mut out = Vec::new();
    doc.save_to(&mut out)
        .map_err(|e| ScrubError::pdf(format!("failed to write sanitized document: {e}")))?;
    Ok(PdfOutcome { bytes: out, warnings })
}

fn load(bytes: &[u8]) -> Result<Document> {
    Document::load_mem(bytes).map_err(|e| ScrubError::pdf(format!("parse failed: {e}")))
}

fn strip_document_info(doc: &mut Document) {
    if let Some(info) = doc.trailer.remove(b"Info") {
        if let Ok(id) = info.as_reference() {
            doc.objects.remove(&id);
        }
    }
}

fn strip_xmp_metadata(doc: &mut Document) {
    let Some(catalog_id) = doc.trailer.get(b"Root").and_then(|o| o.as_reference()).ok() else {
        return;
    };
    let mut metadata_id = None;
    if let Ok(Object::Dictionary(catalog)) = doc.get_object_mut(catalog_id) {
        if let Some(metadata) = catalog.remove(b"Metadata") {
            metadata_id = metadata.as_reference().ok();
        }
    }
    if let Some(id) = metadata_id {
        doc.objects.remove(&id);
    }
}

/// Follow a reference one hop; non-references come back unchanged.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    if let Object::Reference(id) = object {
        doc.get_object(*id).unwrap_or(object)
    } else {
        object
    }
}

fn dict_of<'a>(doc: &'a Document, object: &'a Object) -> Option<&'a lopdf::Dictionary> {
    match resolve(doc, object) {
        Object::Dictionary(d) => Some(d),
        Object::Stream(s) => Some(&s.dict),
        _ => None,
    }
}

/// Scan for active-content indicators, one warning per code.
fn scan_risks(doc: &Document) -> Vec<Warning> {
    let mut open_action = false;
    let mut javascript = false;
    let mut additional_actions = false;
    let mut acro_form = false;
    let mut embedded_files = false;

    if let Some(catalog) =
        doc.trailer.get(b"Root").ok().and_then(|root| dict_of(doc, root))
    {
        open_action = catalog.has(b"OpenAction");
        acro_form = catalog.has(b"AcroForm");
        if let Some(names) = catalog.get(b"Names").ok().and_then(|n| dict_of(doc, n)) {
            javascript |= names.has(b"JavaScript");
            embedded_files = names.has(b"EmbeddedFiles");
        }
    }

    // Actions can hang off pages, annotations, fields -- sweep every object.
    for object in doc.objects.values() {
        let dict = match object {
            Object::Dictionary(d) => d,
            Object::Stream(s) => &s.dict,
            _ => continue,
        };
        if dict.has(b"AA") {
            additional_actions = true;
        }
        if dict.has(b"JS") || dict.has(b"JavaScript") {
            javascript = true;
        }
        if let Ok(Object::Name(subtype)) = dict.get(b"S") {
            if subtype.as_slice() == b"JavaScript" {
                javascript = true;
            }
        }
    }

    let mut warnings = Vec::new();
    if open_action {
        warnings.push(Warning::new(
            WarningCode::PdfRiskOpenaction,
            "document catalog has /OpenAction (runs on open); not removed",
        ));
    }
    if javascript {
        warnings.push(Warning::new(
            WarningCode::PdfRiskJavascript,
            "document references JavaScript actions; not removed",
        ));
    }
    if additional_actions {
        warnings.push(Warning::new(
            WarningCode::PdfRiskAction,
            "document has /AA additional actions; not removed",
        ));
    }
    if acro_form {
        warnings.push(Warning::new(
            WarningCode::PdfRiskForm,
            "document has interactive forms (/AcroForm); not removed",
        ));
    }
    if embedded_files {
        warnings.push(Warning::new(
            WarningCode::PdfRiskEmbeddedFile,
            "document has embedded files (/Names /EmbeddedFiles); not removed",
        ));
    }
    warnings
}
