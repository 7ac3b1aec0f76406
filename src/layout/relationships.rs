//! Cross-references between blocks and regions of a page.
//!
//! The mapper rebuilds every relationship field from scratch, so running it
//! again on an already mapped page changes nothing.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::geometry::BBox;
use crate::model::{ContentBlock, Page, Role};

/// How a numeral in a block is matched to a footnote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FootnoteMatch {
    /// The footnote text starts with the numeral as a whole token
    #[default]
    LeadingMarker,
    /// The footnote text contains the numeral anywhere
    Substring,
}

/// Relationship mapper configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationshipConfig {
    /// Largest left-edge offset between a region and its caption
    pub caption_max_x_offset: f32,
    /// Numerals considered per block
    pub max_footnote_refs: usize,
    pub footnote_match: FootnoteMatch,
}

impl Default for RelationshipConfig {
    fn default() -> Self {
        Self {
            caption_max_x_offset: 50.0,
            max_footnote_refs: 3,
            footnote_match: FootnoteMatch::LeadingMarker,
        }
    }
}

/// Populates captions, footnote links and the section hierarchy.
pub struct RelationshipMapper {
    config: RelationshipConfig,
    numeral: Regex,
}

impl RelationshipMapper {
    pub fn new() -> Self {
        Self::with_config(RelationshipConfig::default())
    }

    pub fn with_config(config: RelationshipConfig) -> Self {
        Self {
            config,
            numeral: Regex::new(r"\d+").expect("valid regex"),
        }
    }

    pub fn map_page(&self, page: &mut Page) {
        for block in &mut page.content_blocks {
            block.relationships.clear();
            block.parent_id = None;
            block.children_ids.clear();
        }
        for table in &mut page.tables {
            table.caption = None;
        }
        for figure in &mut page.figures {
            figure.caption = None;
        }

        self.link_captions(page);
        self.link_footnotes(&mut page.content_blocks);
        link_sections(&mut page.content_blocks);
    }

    fn link_captions(&self, page: &mut Page) {
        let Page {
            content_blocks,
            tables,
            figures,
            ..
        } = page;

        for table in tables.iter_mut() {
            if let Some(block) = self.find_caption(content_blocks, &table.position) {
                table.caption = Some(block.content.clone());
                block.relationships.table_id = Some(table.id.clone());
            }
        }
        for figure in figures.iter_mut() {
            if let Some(block) = self.find_caption(content_blocks, &figure.position) {
                figure.caption = Some(block.content.clone());
                block.relationships.figure_id = Some(figure.id.clone());
            }
        }
    }

    /// First unlinked caption directly below `region` and aligned with it.
    fn find_caption<'a>(&self, blocks: &'a mut [ContentBlock], region: &BBox) -> Option<&'a mut ContentBlock> {
        blocks.iter_mut().find(|block| {
            block.text_type == Role::Caption
                && block.relationships.table_id.is_none()
                && block.relationships.figure_id.is_none()
                && block.position.y0 > region.y1
                && (block.position.x0 - region.x0).abs() < self.config.caption_max_x_offset
        })
    }

    fn link_footnotes(&self, blocks: &mut [ContentBlock]) {
        let footnotes: Vec<(String, String)> = blocks
            .iter()
            .filter(|b| b.text_type == Role::Footnote)
            .map(|b| (b.id.clone(), b.content.clone()))
            .collect();
        if footnotes.is_empty() {
            return;
        }

        for block in blocks.iter_mut().filter(|b| b.text_type != Role::Footnote) {
            let numerals: Vec<&str> = self
                .numeral
                .find_iter(&block.content)
                .take(self.config.max_footnote_refs)
                .map(|m| m.as_str())
                .collect();

            let mut links = Vec::new();
            for numeral in numerals {
                let target = footnotes
                    .iter()
                    .find(|(_, text)| self.footnote_matches(text, numeral));
                if let Some((id, _)) = target {
                    if !links.contains(id) {
                        links.push(id.clone());
                    }
                }
            }
            block.relationships.footnote_ids = links;
        }
    }

    fn footnote_matches(&self, footnote: &str, numeral: &str) -> bool {
        match self.config.footnote_match {
            FootnoteMatch::Substring => footnote.contains(numeral),
            FootnoteMatch::LeadingMarker => self
                .numeral
                .find(footnote.trim_start())
                .is_some_and(|m| m.start() == 0 && m.as_str() == numeral),
        }
    }
}

impl Default for RelationshipMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Parent of each block: the nearest earlier title or heading with a
/// strictly lower hierarchy level. Children lists mirror the parent links.
fn link_sections(blocks: &mut [ContentBlock]) {
    let mut sections: Vec<(u8, usize)> = Vec::new();
    let mut parents: Vec<Option<usize>> = Vec::with_capacity(blocks.len());

    for (index, block) in blocks.iter().enumerate() {
        let parent = sections
            .iter()
            .rev()
            .find(|(level, _)| *level < block.hierarchy_level)
            .map(|(_, i)| *i);
        parents.push(parent);
        if block.text_type.opens_section() {
            sections.push((block.hierarchy_level, index));
        }
    }

    for (child, parent) in parents.into_iter().enumerate() {
        if let Some(parent) = parent {
            let child_id = blocks[child].id.clone();
            blocks[child].parent_id = Some(blocks[parent].id.clone());
            blocks[parent].children_ids.push(child_id);
        }
    }
}
