//! End-to-end tests of the layout pipeline over in-memory page primitives.

use std::collections::HashSet;

use pdfstruct::layout::RelationshipMapper;
use pdfstruct::source::{RawRun, TableGrid};
use pdfstruct::{extract_source, BBox, Document, DocumentContent, ExtractOptions, PageContent, Role};

const BODY: &str = "The committee reviewed the latest figures on output and prices across all regions";

fn make_run(text: &str, x0: f32, y0: f32, x1: f32, size: f32) -> RawRun {
    RawRun::new(text, BBox::new(x0, y0, x1, y0 + size), size)
}

/// Lines of height 11 starting at `y`, `step` apart.
fn push_lines(page: &mut PageContent, texts: &[String], x0: f32, x1: f32, y: f32, step: f32) {
    for (i, text) in texts.iter().enumerate() {
        page.runs.push(make_run(text, x0, y + i as f32 * step, x1, 11.0));
    }
}

fn extract(pages: Vec<PageContent>) -> Document {
    extract_source(&DocumentContent::new(pages), ExtractOptions::default())
}

/// Structural properties every reconstructed document must satisfy.
fn assert_invariants(doc: &Document) {
    for page in &doc.pages {
        let ids: Vec<&str> = page.content_blocks.iter().map(|b| b.id.as_str()).collect();
        let unique: HashSet<&str> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len(), "duplicate block ids on page {}", page.page_number);

        for (index, block) in page.content_blocks.iter().enumerate() {
            assert_eq!(block.hierarchy_level, block.text_type.hierarchy_level());

            if let Some(parent_id) = &block.parent_id {
                let parent_index = ids
                    .iter()
                    .position(|id| id == parent_id)
                    .expect("parent on the same page");
                assert!(parent_index < index, "parent must come first");
                assert!(page.content_blocks[parent_index].hierarchy_level < block.hierarchy_level);
            }

            let expected: Vec<&str> = page
                .content_blocks
                .iter()
                .filter(|b| b.parent_id.as_deref() == Some(block.id.as_str()))
                .map(|b| b.id.as_str())
                .collect();
            let actual: Vec<&str> = block.children_ids.iter().map(String::as_str).collect();
            assert_eq!(actual, expected);
        }

        for (i, a) in page.tables.iter().enumerate() {
            for b in &page.tables[i + 1..] {
                assert!(a.position.overlap_ratio_min(&b.position) < 0.5);
            }
        }
    }
}

// ==================== Column Tests ====================

#[test]
fn test_two_clusters_read_left_then_right() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    let left = [10.0, 12.0, 15.0];
    let right = [300.0, 305.0, 310.0];
    for (i, x0) in left.iter().enumerate() {
        let text = format!("Left side sentence number {} describes wages and working hours.", i);
        page.runs.push(make_run(&text, *x0, 100.0 + i as f32 * 14.0, x0 + 250.0, 11.0));
    }
    for (i, x0) in right.iter().enumerate() {
        let text = format!("Right side sentence number {} describes rents and house prices.", i);
        page.runs.push(make_run(&text, *x0, 100.0 + i as f32 * 14.0, 550.0, 11.0));
    }

    let doc = extract(vec![page]);
    let blocks = &doc.pages[0].content_blocks;

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].content.starts_with("Left side sentence number 0"));
    assert!(blocks[0].content.contains("number 2 describes wages"));
    assert!(blocks[1].content.starts_with("Right side sentence number 0"));
    assert!(!blocks[0].is_multi_column);
    assert_invariants(&doc);
}

#[test]
fn test_unfinished_paragraph_joins_across_columns() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    let left: Vec<String> = (0..6)
        .map(|i| format!("Left column line {} describes regional output and wages in detail", i))
        .collect();
    let right: Vec<String> = (0..6)
        .map(|i| format!("right column continues with line {} about prices and wages today", i))
        .collect();
    push_lines(&mut page, &left, 50.0, 280.0, 100.0, 14.0);
    push_lines(&mut page, &right, 320.0, 550.0, 100.0, 14.0);

    let doc = extract(vec![page.clone()]);
    let blocks = &doc.pages[0].content_blocks;
    assert_eq!(blocks.len(), 1);
    assert!(blocks[0].is_multi_column);
    let left_end = blocks[0].content.find("line 5 describes").unwrap();
    let right_start = blocks[0].content.find("right column continues with line 0").unwrap();
    assert!(left_end < right_start);

    let options = ExtractOptions::default().with_column_join(false);
    let doc = extract_source(&DocumentContent::new(vec![page]), options);
    let blocks = &doc.pages[0].content_blocks;
    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].content.starts_with("Left column line 0"));
    assert!(blocks[1].content.starts_with("right column continues"));
}

// ==================== Paragraph Tests ====================

#[test]
fn test_large_gap_splits_paragraphs() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    // 5 lines with 12-unit gaps, an 80-unit gap, 4 more lines
    let mut y = 100.0;
    for i in 0..9 {
        let text = if i < 5 {
            format!("the opening paragraph explains how the survey was run in wave {}", i)
        } else {
            format!("the closing paragraph reports what the survey found in wave {}", i)
        };
        page.runs.push(make_run(&text, 50.0, y, 550.0, 11.0));
        y += 11.0 + if i == 4 { 80.0 } else { 12.0 };
    }

    let doc = extract(vec![page]);
    let blocks = &doc.pages[0].content_blocks;

    assert_eq!(blocks.len(), 2);
    assert!(blocks[0].content.ends_with("wave 4"));
    assert!(blocks[1].content.starts_with("the closing paragraph"));
    assert!(blocks.iter().all(|b| b.text_type == Role::Paragraph));
    assert_invariants(&doc);
}

// ==================== Classification Tests ====================

#[test]
fn test_title_over_body() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    page.runs
        .push(make_run("Economic Outlook 2024", 150.0, 50.0, 450.0, 24.0).bold());
    push_lines(&mut page, &vec![BODY.to_string(); 6], 50.0, 550.0, 200.0, 14.0);

    let doc = extract(vec![page]);
    let blocks = &doc.pages[0].content_blocks;

    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[0].text_type, Role::Title);
    assert_eq!(blocks[0].hierarchy_level, 1);
    assert_eq!(blocks[1].text_type, Role::Paragraph);
    assert_eq!(blocks[1].parent_id.as_deref(), Some(blocks[0].id.as_str()));
    assert_eq!(blocks[0].children_ids, vec![blocks[1].id.clone()]);
    assert_invariants(&doc);
}

// ==================== Noise Tests ====================

#[test]
fn test_repeated_header_removed_from_inner_pages() {
    let header = "Monthly Bulletin of the National Statistics Office 2024";
    let pages: Vec<PageContent> = (1..=10)
        .map(|n| {
            let mut page = PageContent::new(n, 600.0, 800.0);
            if n > 1 {
                page.runs.push(make_run(header, 50.0, 20.0, 550.0, 11.0));
            }
            let body = format!(
                "In month {} the index of industrial production moved higher than expected",
                n
            );
            push_lines(&mut page, &vec![body; 4], 50.0, 550.0, 200.0, 14.0);
            page
        })
        .collect();

    let doc = extract(pages);
    let has_header = |n: usize| doc.pages[n].content_blocks.iter().any(|b| b.content == header);

    assert!(!has_header(0));
    for n in 1..9 {
        assert!(!has_header(n), "header kept on page {}", n + 1);
        assert_eq!(doc.pages[n].content_blocks.len(), 1);
    }
    assert!(has_header(9));
    assert_eq!(doc.metadata.languages[0].frequency, doc.block_count());
    assert_invariants(&doc);
}

// ==================== Relationship Tests ====================

#[test]
fn test_caption_links_to_table() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    push_lines(&mut page, &vec![BODY.to_string(); 6], 50.0, 550.0, 100.0, 14.0);
    page.table_grids.push(TableGrid {
        bbox: BBox::new(50.0, 400.0, 400.0, 500.0),
        rows: vec![
            vec!["Region".into(), "Revenue".into()],
            vec!["North".into(), "120".into()],
            vec!["South".into(), "95".into()],
        ],
    });
    page.runs.push(make_run("Table 1 Regional Revenue", 55.0, 510.0, 200.0, 9.0));

    let doc = extract(vec![page]);
    let page = &doc.pages[0];
    let caption = page
        .content_blocks
        .iter()
        .find(|b| b.text_type == Role::Caption)
        .unwrap();

    assert_eq!(page.tables.len(), 1);
    assert_eq!(page.tables[0].caption.as_deref(), Some("Table 1 Regional Revenue"));
    assert_eq!(caption.relationships.table_id.as_deref(), Some("page_1_table_0"));
    assert!(page.tables[0].structure.has_header);
    assert_eq!(page.tables[0].cell(2, 1), Some("95"));
    assert_invariants(&doc);
}

#[test]
fn test_misaligned_caption_not_linked() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    push_lines(&mut page, &vec![BODY.to_string(); 6], 50.0, 550.0, 100.0, 14.0);
    page.table_grids.push(TableGrid {
        bbox: BBox::new(50.0, 400.0, 300.0, 500.0),
        rows: vec![vec!["Region".into(), "Revenue".into()], vec!["North".into(), "120".into()]],
    });
    page.runs.push(make_run("Table 1 Regional Revenue", 400.0, 510.0, 540.0, 9.0));

    let doc = extract(vec![page]);
    assert!(doc.pages[0].tables[0].caption.is_none());
    assert!(doc.pages[0]
        .content_blocks
        .iter()
        .all(|b| b.relationships.table_id.is_none()));
}

#[test]
fn test_relationship_mapping_is_idempotent() {
    let mut page = PageContent::new(1, 600.0, 800.0);
    page.runs
        .push(make_run("Economic Outlook 2024", 150.0, 50.0, 450.0, 24.0).bold());
    push_lines(&mut page, &vec![BODY.to_string(); 6], 50.0, 550.0, 200.0, 14.0);
    page.table_grids.push(TableGrid {
        bbox: BBox::new(50.0, 400.0, 400.0, 500.0),
        rows: vec![vec!["Region".into(), "Revenue".into()], vec!["North".into(), "120".into()]],
    });
    page.runs.push(make_run("Table 1 Regional Revenue", 55.0, 510.0, 200.0, 9.0));

    let doc = extract(vec![page]);
    let mut again = doc.pages[0].clone();
    RelationshipMapper::new().map_page(&mut again);
    assert_eq!(again, doc.pages[0]);
}

// ==================== Document Tests ====================

#[test]
fn test_repeated_runs_are_deterministic() {
    let pages: Vec<PageContent> = (1..=4)
        .map(|n| {
            let mut page = PageContent::new(n, 600.0, 800.0);
            page.runs
                .push(make_run("Economic Outlook 2024", 150.0, 50.0, 450.0, 24.0).bold());
            push_lines(&mut page, &vec![BODY.to_string(); 6], 50.0, 550.0, 200.0, 14.0);
            page
        })
        .collect();
    let content = DocumentContent::new(pages);

    let first = extract_source(&content, ExtractOptions::default());
    let second = extract_source(&content, ExtractOptions::default().sequential());
    assert_eq!(first, second);
    assert_eq!(first.metadata.page_count, 4);
    assert_eq!(first.metadata.primary_language, "en");
}

#[test]
fn test_empty_document() {
    let doc = extract(Vec::new());
    assert_eq!(doc.page_count(), 0);
    assert_eq!(doc.metadata.primary_language, "unknown");
    assert!(doc.metadata.languages.is_empty());
}
