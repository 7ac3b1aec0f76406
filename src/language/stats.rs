//! Document-level language statistics.

use std::collections::HashMap;

use crate::geometry::round2;
use crate::model::{language_name, LanguageInfo, LanguageShare, WritingSystem, WritingSystemShare, UNKNOWN_LANGUAGE};

/// Accumulates language and writing-system counts.
///
/// Each page fills its own accumulator; the document assembler merges them
/// in page order and finalizes once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LanguageStats {
    languages: HashMap<String, usize>,
    writing_systems: HashMap<WritingSystem, usize>,
}

impl LanguageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one annotated block. Unknown annotations are ignored.
    pub fn record(&mut self, info: &LanguageInfo) {
        if info.is_unknown() {
            return;
        }
        *self.languages.entry(info.code.clone()).or_insert(0) += 1;
        *self.writing_systems.entry(info.writing_system).or_insert(0) += 1;
    }

    /// Undo a previous [`record`](Self::record), e.g. for a block removed as noise.
    pub fn remove(&mut self, info: &LanguageInfo) {
        if info.is_unknown() {
            return;
        }
        decrement(&mut self.languages, &info.code);
        decrement(&mut self.writing_systems, &info.writing_system);
    }

    pub fn merge(&mut self, other: &LanguageStats) {
        for (code, count) in &other.languages {
            *self.languages.entry(code.clone()).or_insert(0) += count;
        }
        for (system, count) in &other.writing_systems {
            *self.writing_systems.entry(*system).or_insert(0) += count;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }

    /// Language shares (most frequent first, ties by code), primary code and
    /// writing-system shares.
    pub fn finalize(&self) -> (Vec<LanguageShare>, String, Vec<WritingSystemShare>) {
        let total: usize = self.languages.values().sum();
        let mut languages: Vec<LanguageShare> = self
            .languages
            .iter()
            .map(|(code, &frequency)| LanguageShare {
                code: code.clone(),
                name: language_name(code),
                frequency,
                percentage: percentage(frequency, total),
            })
            .collect();
        languages.sort_by(|a, b| b.frequency.cmp(&a.frequency).then_with(|| a.code.cmp(&b.code)));

        let primary = languages
            .first()
            .map(|l| l.code.clone())
            .unwrap_or_else(|| UNKNOWN_LANGUAGE.to_string());

        let total: usize = self.writing_systems.values().sum();
        let mut systems: Vec<WritingSystemShare> = self
            .writing_systems
            .iter()
            .map(|(&system, &count)| WritingSystemShare {
                system,
                count,
                percentage: percentage(count, total),
            })
            .collect();
        systems.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.system.cmp(&b.system)));

        (languages, primary, systems)
    }
}

fn decrement<K: std::hash::Hash + Eq + Clone>(map: &mut HashMap<K, usize>, key: &K) {
    if let Some(count) = map.get_mut(key) {
        *count = count.saturating_sub(1);
        if *count == 0 {
            map.remove(key);
        }
    }
}

fn percentage(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    round2(count as f32 / total as f32 * 100.0)
}
