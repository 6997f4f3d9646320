//! Composition against a real DOCX surface
//!
//! Drives the compositor through `DocxSurface`, saves the result and reads
//! it back with the extractor.

use stylecast_ast::{Block, ListItem};
use stylecast_core::{ComposeOptions, Compositor, DocumentSurface};
use stylecast_ooxml::test_utils::{paragraph, TestDocx};
use stylecast_ooxml::{DocxExtractor, DocxSurface, OoxmlArchive, StyleSheet};

fn template() -> TestDocx {
    TestDocx::new()
        .paragraph_style("Normal", "Normal")
        .paragraph_style("Title", "Title")
        .paragraph_style("Heading1", "heading 1")
        .paragraph_style("Heading2", "heading 2")
        .paragraph_style("ListBullet", "List Bullet")
        .table_style("TableGrid", "Table Grid")
        .body(&paragraph(Some("Normal"), "Company boilerplate"))
        .with_section()
        .as_template()
}

fn blocks() -> Vec<Block> {
    vec![
        Block::title("Report"),
        Block::heading(1, "Intro"),
        Block::paragraph("First line\nsecond line"),
        Block::heading(4, "Deep"),
        Block::List {
            ordered: false,
            items: vec![ListItem::new("one", 0), ListItem::new("two", 1)],
        },
        Block::Table {
            rows: vec![
                vec!["Name".into(), "Age".into()],
                vec!["Alice".into(), "30".into()],
            ],
        },
        Block::Break,
        Block::paragraph("Done"),
    ]
}

#[test]
fn test_compose_into_template_copy() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out.docx");
    template().write_to(&path).unwrap();

    let mut surface = DocxSurface::open(&path).unwrap();
    let outcome = Compositor::new(ComposeOptions::default().with_strict(true))
        .compose(&mut surface, blocks())
        .unwrap();

    assert!(outcome.success, "{:?}", outcome.failure);
    let result = &outcome.write_result;
    assert!(result.polluting_styles.is_empty());
    assert!(result.list_style_used);
    assert_eq!(result.headings_written, 3);
    assert_eq!(result.tables_written, 1);
    assert_eq!(result.table_fallback_count, 0);
    assert_eq!(result.paragraph_errors, 0);
    assert!(result
        .warnings
        .iter()
        .any(|w| w.starts_with("1 heading(s) deeper than the template supports")));
    assert!(matches!(
        surface.paragraph_count(),
        Err(stylecast_core::SurfaceError::Closed)
    ));

    let archive = OoxmlArchive::open(&path).unwrap();
    let types = archive.get_string("[Content_Types].xml").unwrap();
    assert!(types.contains("document.main+xml"));
    assert!(!types.contains("template.main+xml"));

    let styles = StyleSheet::parse(archive.styles_xml().unwrap()).unwrap();
    assert_eq!(styles.paragraph_style_names().len(), 5);

    let document = archive.get_string("word/document.xml").unwrap();
    assert!(document.contains("<w:tblStyle w:val=\"TableGrid\"/>"));
    let boilerplate = document.find("Company boilerplate").unwrap();
    let report = document.find("Report").unwrap();
    let section = document.find("<w:sectPr>").unwrap();
    assert!(boilerplate < report && report < section);

    let extracted = DocxExtractor::new().extract_file(&path);
    assert_eq!(
        &extracted.blocks[..4],
        &[
            Block::paragraph("Company boilerplate"),
            Block::title("Report"),
            Block::heading(1, "Intro"),
            Block::paragraph("First line\nsecond line"),
        ]
    );
    assert!(extracted.blocks.contains(&Block::heading(2, "Deep")));
    assert!(extracted.blocks.contains(&Block::paragraph("Done")));
}

#[test]
fn test_unknown_styles_are_never_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bare.docx");
    TestDocx::new()
        .paragraph_style("Normal", "Normal")
        .write_to(&path)
        .unwrap();

    let mut surface = DocxSurface::open(&path).unwrap();
    let outcome = Compositor::default()
        .compose(
            &mut surface,
            vec![
                Block::title("T"),
                Block::heading(2, "H"),
                Block::List {
                    ordered: true,
                    items: vec![ListItem::new("a", 0), ListItem::new("b", 0)],
                },
            ],
        )
        .unwrap();

    assert!(outcome.success);
    assert!(outcome.write_result.polluting_styles.is_empty());
    assert!(!outcome.write_result.list_style_used);

    let extracted = DocxExtractor::new().extract_file(&path);
    assert_eq!(
        extracted.blocks,
        vec![
            Block::paragraph("T"),
            Block::paragraph("H"),
            Block::paragraph("1. a"),
            Block::paragraph("2. b"),
        ]
    );
}
