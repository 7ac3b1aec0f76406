//! Document assembly: per-page results merged into the final tree.

use std::collections::BTreeSet;

use rayon::prelude::*;

use super::collector::FontHistogram;
use super::features::FeatureExtractor;
use super::noise::reduce_noise;
use super::options::ExtractOptions;
use super::page::{PageProcessor, PageResult};
use crate::language::{LanguageDetector, LanguageStats, ScriptDetector};
use crate::model::{Document, Metadata, Page};
use crate::source::DocumentSource;

/// Drives the page pipeline over a whole document.
pub struct DocumentAssembler {
    processor: PageProcessor,
    features: FeatureExtractor,
}

impl DocumentAssembler {
    /// Create an assembler using the built-in language detector.
    pub fn new(options: ExtractOptions) -> Self {
        Self::with_detector(options, Box::new(ScriptDetector::new()))
    }

    /// Create an assembler with a custom language detector.
    pub fn with_detector(options: ExtractOptions, detector: Box<dyn LanguageDetector>) -> Self {
        Self {
            processor: PageProcessor::new(options, detector),
            features: FeatureExtractor::new(),
        }
    }

    pub fn options(&self) -> &ExtractOptions {
        self.processor.options()
    }

    /// Reconstruct every page of `source` and assemble the document.
    ///
    /// Pages that cannot be read are logged and emitted empty.
    pub fn assemble<D: DocumentSource + ?Sized>(&self, source: &D) -> Document {
        let options = self.processor.options();
        let total = source.page_count();

        let results: Vec<PageResult> = if options.parallel && total > 1 {
            (1..=total)
                .into_par_iter()
                .map(|number| self.process_page(source, number))
                .collect()
        } else {
            (1..=total).map(|number| self.process_page(source, number)).collect()
        };

        let mut fonts = FontHistogram::default();
        let mut languages = LanguageStats::new();
        let mut pages: Vec<Page> = Vec::with_capacity(results.len());
        for result in results {
            fonts.merge(&result.fonts);
            languages.merge(&result.languages);
            pages.push(result.page);
        }

        // Headers and footers
        let removed = reduce_noise(&mut pages, &options.noise);
        let touched: BTreeSet<u32> = removed.iter().map(|b| b.page_number).collect();
        for block in &removed {
            languages.remove(&block.language);
        }
        for page in pages.iter_mut().filter(|p| touched.contains(&p.page_number)) {
            self.processor.mapper().map_page(page);
        }

        if options.ml_features {
            for page in &mut pages {
                self.features.enrich(page, total);
            }
        }

        let source_meta = source.metadata();
        let (language_shares, primary_language, writing_systems) = languages.finalize();
        let metadata = Metadata {
            title: source_meta.title,
            author: source_meta.author,
            creation_date: source_meta.creation_date,
            modification_date: source_meta.modification_date,
            page_count: total,
            source_file: source_meta.source_file,
            languages: language_shares,
            primary_language,
            writing_systems,
        };

        let document = Document { metadata, pages };
        log::info!(
            "Assembled {} pages, {} blocks, primary language {}, body font {:.1}",
            document.page_count(),
            document.block_count(),
            document.metadata.primary_language,
            fonts.mode()
        );
        document
    }

    fn process_page<D: DocumentSource + ?Sized>(&self, source: &D, number: u32) -> PageResult {
        match source.page(number) {
            Ok(content) => self.processor.process(&content),
            Err(e) => {
                log::warn!("Failed to read page {}: {}", number, e);
                PageResult {
                    page: Page::new(number, 0.0, 0.0),
                    fonts: FontHistogram::default(),
                    languages: LanguageStats::new(),
                }
            }
        }
    }
}

impl Default for DocumentAssembler {
    fn default() -> Self {
        Self::new(ExtractOptions::default())
    }
}
