//! Benchmarks for doc2md conversion performance.
//!
//! Run with: cargo bench
//!
//! Synthetic DOCX, XLSX and PDF inputs at several sizes.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use doc2md::{convert_bytes, ConversionOptions};
use std::io::{Cursor, Write};

fn create_zip(entries: &[(&str, String)]) -> Vec<u8> {
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    let mut buffer = Vec::new();
    let mut zip = ZipWriter::new(Cursor::new(&mut buffer));
    let options = SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
    for (name, content) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
    buffer
}

/// Creates a synthetic DOCX document with the given number of paragraphs.
fn create_test_docx(paragraph_count: usize) -> Vec<u8> {
    let mut content = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for i in 0..paragraph_count {
        if i % 10 == 0 {
            content.push_str(&format!(
                r#"<w:p><w:pPr><w:pStyle w:val="Heading2"/></w:pPr><w:r><w:t>Section {}</w:t></w:r></w:p>"#,
                i / 10 + 1
            ));
        }
        content.push_str(&format!(
            r#"<w:p><w:r><w:t>Paragraph {i} with some text that fills a typical line of prose.</w:t></w:r></w:p>"#
        ));
    }
    content.push_str("</w:body></w:document>");
    create_zip(&[("word/document.xml", content)])
}

/// Creates a synthetic XLSX workbook with one sheet of `row_count` rows.
fn create_test_xlsx(row_count: usize) -> Vec<u8> {
    let mut sheet = String::from("<worksheet><sheetData>");
    for row in 1..=row_count {
        sheet.push_str(&format!(
            r#"<row r="{row}"><c r="A{row}" t="s"><v>{}</v></c><c r="B{row}"><v>{}</v></c><c r="C{row}" t="inlineStr"><is><t>note {row}</t></is></c></row>"#,
            row % 4,
            row * 3
        ));
    }
    sheet.push_str("</sheetData></worksheet>");
    let shared = "<sst><si><t>alpha</t></si><si><t>beta</t></si><si><t>gamma</t></si><si><t>delta</t></si></sst>";
    create_zip(&[
        ("xl/workbook.xml", "<workbook/>".to_string()),
        ("xl/sharedStrings.xml", shared.to_string()),
        ("xl/worksheets/sheet1.xml", sheet),
    ])
}

/// Creates a synthetic PDF with one Flate-compressed content stream per page.
fn create_test_pdf(page_count: usize) -> Vec<u8> {
    use flate2::write::ZlibEncoder;
    use flate2::Compression;

    let mut file = b"%PDF-1.4\n".to_vec();
    for page in 1..=page_count {
        let mut content = String::new();
        for line in 0..20 {
            content.push_str(&format!(
                "BT /F1 11 Tf 72 {} Td (Page {page} line {line}) Tj ET\n",
                700 - line * 14
            ));
        }
        let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(content.as_bytes()).unwrap();
        let packed = encoder.finish().unwrap();

        let header = format!(
            "{page} 0 obj\n<< /Length {} /Filter /FlateDecode >>\nstream\n",
            packed.len()
        );
        file.extend_from_slice(header.as_bytes());
        file.extend_from_slice(&packed);
        file.extend_from_slice(b"\nendstream\nendobj\n");
    }
    file.extend_from_slice(b"trailer\n<< >>\n%%EOF\n");
    file
}

fn bench_format(
    c: &mut Criterion,
    name: &str,
    extension: &str,
    sizes: &[usize],
    create: fn(usize) -> Vec<u8>,
) {
    let mut group = c.benchmark_group(name);
    let options = ConversionOptions::default();

    for &size in sizes {
        let data = create(size);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &data, |b, data| {
            b.iter(|| convert_bytes(black_box(data), extension, &options));
        });
    }

    group.finish();
}

/// Benchmark DOCX conversion by paragraph count.
fn bench_docx_conversion(c: &mut Criterion) {
    bench_format(c, "docx_conversion", "docx", &[10, 100, 1000], create_test_docx);
}

/// Benchmark XLSX conversion by row count.
fn bench_xlsx_conversion(c: &mut Criterion) {
    bench_format(c, "xlsx_conversion", "xlsx", &[10, 100, 1000], create_test_xlsx);
}

/// Benchmark PDF text extraction by page count.
fn bench_pdf_extraction(c: &mut Criterion) {
    bench_format(c, "pdf_extraction", "pdf", &[1, 10, 100], create_test_pdf);
}

criterion_group!(
    benches,
    bench_docx_conversion,
    bench_xlsx_conversion,
    bench_pdf_extraction,
);
criterion_main!(benches);
