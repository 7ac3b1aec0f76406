//! Continuation of paragraphs across column breaks.

use serde::{Deserialize, Serialize};

use super::paragraphs::ProtoBlock;
use crate::model::Role;

/// Column join configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JoinConfig {
    /// Largest font size difference between the two halves
    pub max_font_difference: f32,
    /// Characters that end a paragraph
    pub terminal_punctuation: String,
}

impl Default for JoinConfig {
    fn default() -> Self {
        Self {
            max_font_difference: 1.0,
            terminal_punctuation: ".!?:;".to_string(),
        }
    }
}

/// Merge paragraphs that continue from the bottom of one column to the top
/// of the next, then flatten the columns into reading order.
pub fn join_columns(mut columns: Vec<Vec<ProtoBlock>>, config: &JoinConfig) -> Vec<ProtoBlock> {
    for i in 1..columns.len() {
        let (left, right) = columns.split_at_mut(i);
        let (Some(last), Some(first)) = (left[i - 1].last_mut(), right[0].first()) else {
            continue;
        };
        if !continues(last, first, config) {
            continue;
        }

        let first = right[0].remove(0);
        last.text = format!("{} {}", last.text.trim_end(), first.text.trim_start());
        last.bbox = last.bbox.union(&first.bbox);
        last.font_size = last.font_size.max(first.font_size);
        last.is_multi_column = true;
        log::debug!("Joined paragraph across column break {}", i);
    }

    columns.into_iter().flatten().collect()
}

fn continues(last: &ProtoBlock, first: &ProtoBlock, config: &JoinConfig) -> bool {
    last.role == Role::Paragraph
        && first.role == Role::Paragraph
        && (last.font_size - first.font_size).abs() <= config.max_font_difference
        && !last
            .text
            .trim_end()
            .ends_with(|c: char| config.terminal_punctuation.contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;

    fn make_block(text: &str, x0: f32, y0: f32, y1: f32, role: Role) -> ProtoBlock {
        ProtoBlock {
            text: text.to_string(),
            bbox: BBox::new(x0, y0, x0 + 250.0, y1),
            font_size: 10.0,
            bold: false,
            role,
            is_multi_column: false,
        }
    }

    #[test]
    fn test_unfinished_paragraph_continues() {
        let columns = vec![
            vec![
                make_block("First paragraph.", 50.0, 100.0, 200.0, Role::Paragraph),
                make_block("The economy grew in the", 50.0, 220.0, 700.0, Role::Paragraph),
            ],
            vec![
                make_block("second half of the year.", 320.0, 100.0, 300.0, Role::Paragraph),
                make_block("Another one.", 320.0, 320.0, 400.0, Role::Paragraph),
            ],
        ];
        let blocks = join_columns(columns, &JoinConfig::default());

        assert_eq!(blocks.len(), 3);
        assert_eq!(blocks[1].text, "The economy grew in the second half of the year.");
        assert!(blocks[1].is_multi_column);
        assert_eq!(blocks[1].bbox, BBox::new(50.0, 100.0, 570.0, 700.0));
        assert_eq!(blocks[2].text, "Another one.");
    }

    #[test]
    fn test_finished_or_non_paragraph_not_joined() {
        let columns = vec![
            vec![make_block("Ends here.", 50.0, 100.0, 200.0, Role::Paragraph)],
            vec![make_block("Next column", 320.0, 100.0, 200.0, Role::Paragraph)],
            vec![make_block("Results", 590.0, 100.0, 120.0, Role::Heading)],
        ];
        let blocks = join_columns(columns, &JoinConfig::default());
        assert_eq!(blocks.len(), 3);
        assert!(blocks.iter().all(|b| !b.is_multi_column));
    }

    #[test]
    fn test_font_difference_blocks_join() {
        let mut big = make_block("continues", 320.0, 100.0, 200.0, Role::Paragraph);
        big.font_size = 12.0;
        let columns = vec![vec![make_block("A sentence that", 50.0, 100.0, 200.0, Role::Paragraph)], vec![big]];
        assert_eq!(join_columns(columns, &JoinConfig::default()).len(), 2);
    }
}
