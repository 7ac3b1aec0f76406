//! Repeated header and footer removal.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::model::{ContentBlock, Page};

/// Noise reducer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseConfig {
    /// Characters of a block compared across pages
    pub prefix_chars: usize,
    /// A prefix found on more than this share of pages is a header or footer
    pub min_page_ratio: f32,
    /// Keep headers and footers on the first and last page
    pub exempt_first_last: bool,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            prefix_chars: 50,
            min_page_ratio: 0.5,
            exempt_first_last: true,
        }
    }
}

fn prefix(text: &str, chars: usize) -> String {
    text.chars().take(chars).collect()
}

/// Remove repeated headers and footers from all pages.
///
/// Candidates are the first and last block of every page. Returns the
/// removed blocks in page order.
pub fn reduce_noise(pages: &mut [Page], config: &NoiseConfig) -> Vec<ContentBlock> {
    let total = pages.len();
    if total == 0 {
        return Vec::new();
    }

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for page in pages.iter() {
        let edges: HashSet<String> = page
            .content_blocks
            .first()
            .into_iter()
            .chain(page.content_blocks.last())
            .map(|b| prefix(&b.content, config.prefix_chars))
            .filter(|p| !p.trim().is_empty())
            .collect();
        for edge in edges {
            *frequency.entry(edge).or_insert(0) += 1;
        }
    }

    let repeated: HashSet<String> = frequency
        .into_iter()
        .filter(|(_, count)| *count as f32 > total as f32 * config.min_page_ratio)
        .map(|(text, _)| text)
        .collect();
    if repeated.is_empty() {
        return Vec::new();
    }

    let mut removed = Vec::new();
    for (index, page) in pages.iter_mut().enumerate() {
        if config.exempt_first_last && (index == 0 || index == total - 1) {
            continue;
        }
        let (noise, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut page.content_blocks)
            .into_iter()
            .partition(|b| repeated.contains(&prefix(&b.content, config.prefix_chars)));
        page.content_blocks = kept;
        removed.extend(noise);
    }

    log::debug!(
        "NoiseReducer: {} repeated strings, {} blocks removed",
        repeated.len(),
        removed.len()
    );
    removed
}
