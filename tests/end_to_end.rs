//! End-to-end scenarios exercising the load, decode and incremental-write
//! paths together, built from small inline PDF buffers rather than checked-in
//! binary fixtures.

use std::collections::HashSet;
use std::convert::TryInto;

use pdf_object_core::object::{Dictionary, Object, ObjectId, Stream, StringFormat};
use pdf_object_core::parser::{self, ParserInput};
use pdf_object_core::reader::Reader;
use pdf_object_core::xref::{XrefEntry, XrefType};
use pdf_object_core::{Document, IncrementalDocument};

/// A tiny four-object PDF (Catalog, Pages, Page, Font), with a classic xref
/// table, used by the minimal-file and append scenarios below.
fn four_object_pdf() -> Vec<u8> {
    let body = "%PDF-1.1\n\
1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[3 0 R]/Count 1>>endobj\n\
3 0 obj<</Type/Page/Parent 2 0 R/Resources<</Font<</F1 4 0 R>>>>/MediaBox[0 0 612 792]>>endobj\n\
4 0 obj<</Type/Font/Subtype/Type1/BaseFont/Times-Roman>>endobj\n";
    let offsets: Vec<usize> =
        ["1 0 obj", "2 0 obj", "3 0 obj", "4 0 obj"].iter().map(|marker| body.find(marker).unwrap()).collect();

    let xref_start = body.len();
    let mut out = String::from(body);
    out.push_str("xref\n0 5\n0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str("trailer\n<</Size 5/Root 1 0 R>>\nstartxref\n");
    out.push_str(&xref_start.to_string());
    out.push_str("\n%%EOF");
    out.into_bytes()
}

/// A three-page PDF used by the remove_page append scenario.
fn three_page_pdf() -> Vec<u8> {
    let body = "%PDF-1.4\n\
1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n\
2 0 obj<</Type/Pages/Kids[3 0 R 4 0 R 5 0 R]/Count 3>>endobj\n\
3 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n\
4 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n\
5 0 obj<</Type/Page/Parent 2 0 R/MediaBox[0 0 612 792]>>endobj\n";
    let offsets: Vec<usize> = ["1 0 obj", "2 0 obj", "3 0 obj", "4 0 obj", "5 0 obj"]
        .iter()
        .map(|marker| body.find(marker).unwrap())
        .collect();

    let xref_start = body.len();
    let mut out = String::from(body);
    out.push_str("xref\n0 6\n0000000000 65535 f \n");
    for offset in &offsets {
        out.push_str(&format!("{offset:010} 00000 n \n"));
    }
    out.push_str("trailer\n<</Size 6/Root 1 0 R>>\nstartxref\n");
    out.push_str(&xref_start.to_string());
    out.push_str("\n%%EOF");
    out.into_bytes()
}

/// Scenario 1: minimal file parse.
#[test]
fn minimal_four_object_file_parses() {
    let buffer = four_object_pdf();
    let doc = Document::load_mem(&buffer).unwrap();

    assert_eq!(doc.version, "1.1");
    assert_eq!(doc.reference_table.entries.len(), 4);

    let catalog = doc.get_object((1, 0)).unwrap();
    assert!(catalog.as_dict().unwrap().has_type(b"Catalog"));

    let page = doc.get_object((3, 0)).unwrap();
    let resources = page.as_dict().unwrap().get(b"Resources").unwrap().as_dict().unwrap();
    let font_ref = resources.get(b"Font").unwrap().as_dict().unwrap().get(b"F1").unwrap().as_reference().unwrap();
    let font = doc.get_object(font_ref).unwrap();
    assert_eq!(font.as_dict().unwrap().get(b"BaseFont").unwrap().as_name().unwrap(), b"Times-Roman");
}

/// Scenario 2: version preceded by junk bytes not claiming to be a header.
#[test]
fn version_preceded_by_junk_bytes() {
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"\x00\x01garbage-before-header-not-a-pdf-marker\xff\xfe");
    buffer.extend_from_slice(&four_object_pdf());

    let doc = Document::load_mem(&buffer).unwrap();
    assert_eq!(doc.version, "1.1");
    assert_eq!(doc.reference_table.entries.len(), 4);
}

/// Scenario 3: xref stream with `/W [1 2 2]`, matching the five records
/// (object 0 free, objects 1-3 compressed in container 15, object 4 at a
/// literal offset) described in the specification.
#[test]
fn xref_stream_with_mixed_width_fields_decodes() {
    let records: [[u8; 5]; 5] = [
        [0x00, 0x00, 0x00, 0xFF, 0xFF],
        [0x02, 0x00, 0x0F, 0x00, 0x00],
        [0x02, 0x00, 0x0F, 0x00, 0x01],
        [0x02, 0x00, 0x0F, 0x00, 0x02],
        [0x01, 0xBA, 0x5E, 0x00, 0x00],
    ];
    let mut body = Vec::new();
    for record in &records {
        body.extend_from_slice(record);
    }

    let mut buffer = Vec::new();
    buffer.extend_from_slice(
        format!("5 0 obj\n<< /Type /XRef /W [1 2 2] /Size 5 /Root 1 0 R /Length {} >>\nstream\n", body.len())
            .as_bytes(),
    );
    buffer.extend_from_slice(&body);
    buffer.extend_from_slice(b"\nendstream\nendobj\n");

    let reader = Reader {
        buffer: &buffer,
        document: Document::new(),
        encryption_state: None,
        password: None,
        raw_objects: Default::default(),
    };
    let input = ParserInput::new_extra(&buffer, "xref-stream");
    let (xref, _trailer) = parser::xref_and_trailer(input, &reader).unwrap();

    assert_eq!(xref.size, 5);
    assert_eq!(xref.get(3), Some(&XrefEntry::Compressed { container: 15, index: 2 }));
    assert_eq!(xref.get(4), Some(&XrefEntry::Normal { offset: 0xBA5E, generation: 0 }));
    assert_eq!(xref.xref_type, XrefType::CrossReferenceStream);
}

/// Scenario 5: appending zero staged objects leaves the original bytes
/// untouched at the front of the output and parses back to the same object
/// graph.
#[test]
fn append_noop_preserves_original_bytes_as_a_prefix() {
    let original = four_object_pdf();
    let mut incremental: IncrementalDocument = original.as_slice().try_into().unwrap();

    let mut output = Vec::new();
    {
        let mut appender = incremental.appender();
        appender.write(&mut output).unwrap();
    }

    assert!(output.len() > original.len());
    assert_eq!(&output[..original.len()], original.as_slice());

    let reparsed = Document::load_mem(&output).unwrap();
    let catalog = reparsed.get_object((1, 0)).unwrap();
    assert!(catalog.as_dict().unwrap().has_type(b"Catalog"));
}

/// Scenario 6: removing two pages from a three-page document leaves a single
/// entry in `/Kids`.
#[test]
fn append_remove_page_shrinks_kids_array() {
    let original = three_page_pdf();
    let mut incremental: IncrementalDocument = original.as_slice().try_into().unwrap();

    let mut output = Vec::new();
    {
        let mut appender = incremental.appender();
        appender.remove_page(1).unwrap();
        appender.remove_page(2).unwrap();
        appender.write(&mut output).unwrap();
    }

    let reparsed = Document::load_mem(&output).unwrap();
    let catalog = reparsed.get_object((1, 0)).unwrap();
    let pages_ref = catalog.as_dict().unwrap().get(b"Pages").unwrap().as_reference().unwrap();
    let pages = reparsed.get_object(pages_ref).unwrap();
    let kids = pages.as_dict().unwrap().get(b"Kids").unwrap().as_array().unwrap();
    assert_eq!(kids.len(), 1);
}

/// Scenario 7: a second call to `write` on the same appender is refused, and
/// the first sink's contents are unaffected by the attempt.
#[test]
fn double_write_is_refused() {
    let original = four_object_pdf();
    let mut incremental: IncrementalDocument = original.as_slice().try_into().unwrap();
    let mut appender = incremental.appender();

    let mut sink1 = Vec::new();
    appender.write(&mut sink1).unwrap();
    let sink1_snapshot = sink1.clone();

    let mut sink2 = Vec::new();
    let second = appender.write(&mut sink2);

    assert!(second.is_err());
    assert_eq!(sink1, sink1_snapshot);
    assert!(sink2.is_empty());
}

/// A minimal object-stream (ObjStm) container round-trips through the
/// resolver: objects 1 and 2 live entirely inside object 3's compressed body.
#[test]
fn compressed_objects_resolve_through_their_container() {
    let inner = b"1 0 42 4 2 0 true ";
    let header_len = inner.iter().position(|&b| b == b't').unwrap();
    let mut buffer = Vec::new();
    buffer.extend_from_slice(b"%PDF-1.5\n");

    let objstm_marker = "3 0 obj<</Type/ObjStm/N 2/First ";
    let objstm_offset = buffer.len();
    buffer.extend_from_slice(
        format!("{objstm_marker}{header_len}/Length {}>>stream\n", inner.len()).as_bytes(),
    );
    buffer.extend_from_slice(inner);
    buffer.extend_from_slice(b"\nendstream\nendobj\n");

    let catalog_offset = buffer.len();
    buffer.extend_from_slice(b"4 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");
    let pages_offset = buffer.len();
    buffer.extend_from_slice(b"2 0 obj<</Type/Pages/Kids[]/Count 0>>endobj\n");

    let xref_start = buffer.len();
    buffer.extend_from_slice(b"xref\n0 5\n0000000000 65535 f \n0000000000 00000 f \n");
    buffer.extend_from_slice(format!("{pages_offset:010} 00000 n \n").as_bytes());
    buffer.extend_from_slice(format!("{objstm_offset:010} 00000 n \n").as_bytes());
    buffer.extend_from_slice(format!("{catalog_offset:010} 00000 n \n").as_bytes());
    buffer.extend_from_slice(b"trailer\n<</Size 5/Root 4 0 R>>\nstartxref\n");
    buffer.extend_from_slice(xref_start.to_string().as_bytes());
    buffer.extend_from_slice(b"\n%%EOF");

    let doc = Document::load_mem(&buffer).unwrap();
    assert_eq!(doc.get_object((1, 0)).unwrap().as_i64().unwrap(), 42);
    assert_eq!(doc.get_object((2, 0)).unwrap().as_dict().unwrap().has_type(b"Pages"), true);
}

#[allow(dead_code)]
fn unused_imports_silencer(_: HashSet<ObjectId>, _: Dictionary, _: Object, _: Stream, _: StringFormat) {}
