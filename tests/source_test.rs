//! Tests for the input adapters: primitives dumps and lopdf-backed PDFs.

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document as LopdfDocument, Object, Stream};

use pdfstruct::{DocumentContent, DocumentSource, Error, PdfSource, Pdfstruct, Role};

const BODY_LINES: [&str; 5] = [
    "Output grew steadily through the year as demand for exports recovered",
    "and household spending held up better than most forecasters expected",
    "while the labour market stayed tight with unemployment near its lows",
    "and wage growth eased slowly as inflation expectations came back down",
    "so the central bank kept its policy rate unchanged for the whole year.",
];

/// A one-page A4 PDF with a filled background, a bold title and five body lines.
fn make_pdf() -> Vec<u8> {
    let mut doc = LopdfDocument::with_version("1.5");
    let pages_id = doc.new_object_id();

    let bold_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica-Bold",
    });
    let regular_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => bold_id,
            "F2" => regular_id,
        },
    });

    let mut operations = vec![
        // White page background
        Operation::new("g", vec![1.into()]),
        Operation::new("re", vec![0.into(), 0.into(), 595.into(), 842.into()]),
        Operation::new("f", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F1".into(), 24.into()]),
        Operation::new("Td", vec![100.into(), 700.into()]),
        Operation::new("Tj", vec![Object::string_literal("Annual Report 2024")]),
        Operation::new("ET", vec![]),
        Operation::new("BT", vec![]),
        Operation::new("Tf", vec!["F2".into(), 11.into()]),
        Operation::new("Td", vec![72.into(), 600.into()]),
    ];
    for (i, line) in BODY_LINES.iter().enumerate() {
        if i > 0 {
            operations.push(Operation::new("Td", vec![0.into(), (-14).into()]));
        }
        operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
    }
    operations.push(Operation::new("ET", vec![]));

    // A stroked rule under the title
    operations.push(Operation::new("m", vec![100.into(), 690.into()]));
    operations.push(Operation::new("l", vec![400.into(), 690.into()]));
    operations.push(Operation::new("S", vec![]));

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => resources_id,
    });
    let pages = dictionary! {
        "Type" => "Pages",
        "Kids" => vec![page_id.into()],
        "Count" => 1,
        "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
    };
    doc.objects.insert(pages_id, Object::Dictionary(pages));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    let info_id = doc.add_object(dictionary! {
        "Title" => Object::string_literal("Annual Report"),
        "Author" => Object::string_literal("Statistics Office"),
        "CreationDate" => Object::string_literal("D:20240301120000Z"),
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

// ==================== PDF Source Tests ====================

#[test]
fn test_pdf_page_primitives() {
    let source = PdfSource::from_bytes(&make_pdf()).unwrap();
    assert_eq!(source.page_count(), 1);
    assert_eq!(source.version(), "1.5");

    let page = source.page(1).unwrap();
    assert_eq!((page.width, page.height), (595.0, 842.0));
    assert_eq!(page.runs.len(), 1 + BODY_LINES.len());

    let title = &page.runs[0];
    assert_eq!(title.text, "Annual Report 2024");
    assert_eq!(title.font_size, 24.0);
    assert!(title.bold);
    assert_eq!(title.bbox.x0, 100.0);
    // Baseline 700 from the bottom, ascent 0.8 of the size
    assert!((title.bbox.y0 - 122.8).abs() < 1e-3);

    let body = &page.runs[1];
    assert!(!body.bold);
    assert_eq!(body.bbox.x0, 72.0);
    assert!((page.runs[2].bbox.y0 - body.bbox.y0 - 14.0).abs() < 1e-3);

    assert_eq!(page.lines.len(), 1);
    assert!((page.lines[0].y0 - 152.0).abs() < 1e-3);
}

#[test]
fn test_pdf_metadata() {
    let source = PdfSource::from_bytes(&make_pdf()).unwrap();
    let metadata = source.metadata();

    assert_eq!(metadata.title.as_deref(), Some("Annual Report"));
    assert_eq!(metadata.author.as_deref(), Some("Statistics Office"));
    assert_eq!(
        metadata.creation_date.map(|d| d.to_rfc3339()),
        Some("2024-03-01T12:00:00+00:00".to_string())
    );
    assert!(metadata.source_file.is_none());
}

#[test]
fn test_pdf_page_out_of_range() {
    let source = PdfSource::from_bytes(&make_pdf()).unwrap();
    assert!(matches!(source.page(2), Err(Error::PageOutOfRange(2, 1))));
}

#[test]
fn test_pdf_open_records_file_name() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("report.pdf");
    std::fs::write(&path, make_pdf()).unwrap();

    let source = PdfSource::open(&path).unwrap();
    assert_eq!(source.metadata().source_file.as_deref(), Some("report.pdf"));
}

#[test]
fn test_pdf_end_to_end() {
    let result = Pdfstruct::new().extract_bytes(&make_pdf()).unwrap();
    let doc = result.document();

    assert_eq!(doc.metadata.page_count, 1);
    assert_eq!(doc.metadata.title.as_deref(), Some("Annual Report"));
    assert_eq!(doc.metadata.primary_language, "en");

    let blocks = &doc.pages[0].content_blocks;
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].content, "Annual Report 2024");
    assert_eq!(blocks[0].text_type, Role::Title);
    assert!(blocks[1].content.starts_with("Output grew steadily"));
    assert!(blocks[1].content.ends_with("for the whole year."));
}

#[test]
fn test_non_pdf_bytes_rejected() {
    assert!(matches!(
        PdfSource::from_bytes(b"PK\x03\x04 not a pdf"),
        Err(Error::UnknownFormat)
    ));
    assert!(PdfSource::from_bytes(b"%PDF-1.4\nbroken").is_err());
}

// ==================== Primitives Dump Tests ====================

#[test]
fn test_dump_renumbers_zero_pages() {
    let json = r#"{
        "pages": [
            {"number": 0, "width": 600, "height": 800},
            {"number": 0, "width": 600, "height": 800,
             "runs": [{"text": "Hello", "bbox": {"x0": 10, "y0": 10, "x1": 40, "y1": 21}, "font_size": 11}]}
        ]
    }"#;
    let content = DocumentContent::from_json_str(json).unwrap();

    assert_eq!(content.pages[0].number, 1);
    assert_eq!(content.pages[1].number, 2);
    assert_eq!(content.page_count(), 2);
    assert_eq!(content.page(2).unwrap().runs[0].text, "Hello");
}

#[test]
fn test_dump_rejects_bad_input() {
    let zero_size = r#"{"pages": [{"number": 1, "width": 0, "height": 800}]}"#;
    assert!(matches!(
        DocumentContent::from_json_str(zero_size),
        Err(Error::InvalidSource(_))
    ));
    assert!(matches!(
        DocumentContent::from_json_str("{not json"),
        Err(Error::InvalidSource(_))
    ));
}

#[test]
fn test_dump_round_trip() {
    let mut content = DocumentContent::from_json_str(
        r#"{"pages": [{"number": 1, "width": 595, "height": 842}]}"#,
    )
    .unwrap();
    content.metadata.title = Some("Dump".to_string());

    let back = DocumentContent::from_json_str(&content.to_json().unwrap()).unwrap();
    assert_eq!(back, content);
}
