//! Language and writing-system annotation.
//!
//! Detection is a port: anything implementing [`LanguageDetector`] can be
//! plugged into the pipeline. [`ScriptDetector`] is the built-in
//! implementation, based on Unicode script counts and, for Latin text, on
//! stopword frequencies.

mod stats;

pub use stats::LanguageStats;

use std::collections::HashSet;

use unicode_bidi::{bidi_class, BidiClass};

use crate::geometry::round2;
use crate::model::{LanguageInfo, WritingSystem};

/// Minimum trimmed length (in chars) for text to be annotated at all.
pub const MIN_DETECTION_CHARS: usize = 3;

/// Confidence used when the detector abstains and the code is inferred
/// from the writing system.
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Result of a successful detection.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// ISO 639-1 code
    pub code: String,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

/// A text classifier: text in, language code out.
pub trait LanguageDetector: Send + Sync {
    /// Detect the language of `text`, or `None` to abstain.
    fn detect(&self, text: &str) -> Option<Detection>;
}

/// Annotate `text` with language and writing system.
pub fn annotate(detector: &dyn LanguageDetector, text: &str) -> LanguageInfo {
    let trimmed = text.trim();
    if trimmed.chars().count() < MIN_DETECTION_CHARS {
        return LanguageInfo::unknown();
    }

    let system = writing_system(trimmed);
    match detector.detect(trimmed) {
        Some(detection) => LanguageInfo::new(&detection.code, round2(detection.confidence), system),
        None => LanguageInfo::new(system.default_language(), FALLBACK_CONFIDENCE, system),
    }
}

/// Classify the script directionality of `text`.
///
/// CJK wins over everything; right-to-left letters make the text `rtl`, or
/// `mixed` when Latin letters are present too.
pub fn writing_system(text: &str) -> WritingSystem {
    let mut has_rtl = false;
    let mut has_latin = false;

    for c in text.chars() {
        if is_cjk_char(c) {
            return WritingSystem::Cjk;
        }
        if matches!(bidi_class(c), BidiClass::R | BidiClass::AL) {
            has_rtl = true;
        } else if c.is_ascii_alphabetic() {
            has_latin = true;
        }
    }

    match (has_rtl, has_latin) {
        (true, false) => WritingSystem::Rtl,
        (true, true) => WritingSystem::Mixed,
        _ => WritingSystem::Ltr,
    }
}

/// Han, kana, Hangul syllables and CJK punctuation.
pub fn is_cjk_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0xF900..=0xFAFF
        | 0x3000..=0x303F
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0xAC00..=0xD7AF)
}

/// Characters of scripts written without spaces between words.
///
/// Hangul is not included: Korean separates words with spaces.
pub fn is_spaceless_script_char(c: char) -> bool {
    matches!(c as u32,
        0x4E00..=0x9FFF
        | 0x3400..=0x4DBF
        | 0x20000..=0x2A6DF
        | 0x2A700..=0x2EBEF
        | 0x3040..=0x309F
        | 0x30A0..=0x30FF
        | 0x3000..=0x303F)
}

#[derive(Debug, Default)]
struct ScriptCounts {
    latin: usize,
    han: usize,
    kana: usize,
    hangul: usize,
    arabic: usize,
    persian: usize,
    hebrew: usize,
    cyrillic: usize,
    ukrainian: usize,
    greek: usize,
    thai: usize,
    devanagari: usize,
}

impl ScriptCounts {
    fn of(text: &str) -> Self {
        let mut counts = Self::default();
        for c in text.chars() {
            match c as u32 {
                0x0041..=0x005A | 0x0061..=0x007A | 0x00C0..=0x024F => counts.latin += 1,
                0x4E00..=0x9FFF | 0x3400..=0x4DBF | 0xF900..=0xFAFF => counts.han += 1,
                0x3040..=0x30FF => counts.kana += 1,
                0xAC00..=0xD7AF | 0x1100..=0x11FF | 0x3130..=0x318F => counts.hangul += 1,
                0x067E | 0x0686 | 0x0698 | 0x06AF | 0x06CC => {
                    counts.arabic += 1;
                    counts.persian += 1;
                }
                0x0600..=0x06FF | 0x0750..=0x077F | 0x08A0..=0x08FF | 0xFB50..=0xFDFF
                | 0xFE70..=0xFEFF => counts.arabic += 1,
                0x0590..=0x05FF => counts.hebrew += 1,
                0x0456 | 0x0457 | 0x0454 | 0x0491 => {
                    counts.cyrillic += 1;
                    counts.ukrainian += 1;
                }
                0x0400..=0x04FF => counts.cyrillic += 1,
                0x0370..=0x03FF => counts.greek += 1,
                0x0E00..=0x0E7F => counts.thai += 1,
                0x0900..=0x097F => counts.devanagari += 1,
                _ => {}
            }
        }
        counts
    }

    fn letters(&self) -> usize {
        self.latin
            + self.han
            + self.kana
            + self.hangul
            + self.arabic
            + self.hebrew
            + self.cyrillic
            + self.greek
            + self.thai
            + self.devanagari
    }
}

const STOPWORDS: &[(&str, &[&str])] = &[
    ("en", &["the", "and", "of", "to", "in", "is", "that", "for", "with", "as", "are", "on", "this", "by", "be", "from", "was", "it", "which", "or"]),
    ("de", &["der", "die", "das", "und", "ist", "nicht", "mit", "den", "von", "zu", "sich", "auf", "für", "ein", "eine", "dem", "auch", "wird", "im", "des"]),
    ("fr", &["le", "la", "les", "et", "des", "est", "une", "dans", "pour", "que", "qui", "du", "sur", "pas", "par", "au", "avec", "sont", "ce", "en"]),
    ("es", &["el", "los", "las", "y", "que", "del", "en", "por", "una", "con", "para", "es", "se", "como", "más", "su", "al", "lo", "pero", "sus"]),
    ("it", &["il", "di", "che", "e", "la", "per", "un", "del", "della", "sono", "non", "con", "gli", "una", "nel", "anche", "dei", "alla", "come", "è"]),
    ("pt", &["o", "os", "as", "de", "que", "não", "em", "um", "uma", "para", "com", "do", "da", "dos", "das", "por", "mais", "ao", "se", "são"]),
    ("nl", &["de", "het", "een", "en", "van", "is", "dat", "niet", "op", "te", "zijn", "voor", "met", "die", "ook", "aan", "er", "maar", "wordt", "bij"]),
];

/// Characters that point at a single Latin-script language.
const DIACRITIC_HINTS: &[(char, &str)] = &[
    ('ß', "de"),
    ('ä', "de"),
    ('ö', "de"),
    ('ü', "de"),
    ('ñ', "es"),
    ('¿', "es"),
    ('ç', "fr"),
    ('œ', "fr"),
    ('ê', "fr"),
    ('ã', "pt"),
    ('õ', "pt"),
    ('ò', "it"),
    ('ĳ', "nl"),
];

/// Built-in detector based on Unicode scripts and stopwords.
pub struct ScriptDetector {
    stopwords: Vec<(&'static str, HashSet<&'static str>)>,
}

impl ScriptDetector {
    pub fn new() -> Self {
        Self {
            stopwords: STOPWORDS
                .iter()
                .map(|(code, words)| (*code, words.iter().copied().collect()))
                .collect(),
        }
    }

    fn detect_latin(&self, text: &str) -> Option<Detection> {
        let lower = text.to_lowercase();
        let words: Vec<&str> = lower
            .split(|c: char| !c.is_alphabetic())
            .filter(|w| !w.is_empty())
            .collect();
        if words.is_empty() {
            return None;
        }

        let mut scores: Vec<(&str, usize)> = self
            .stopwords
            .iter()
            .map(|(code, list)| (*code, words.iter().filter(|w| list.contains(*w)).count()))
            .collect();

        for (hint, code) in DIACRITIC_HINTS {
            if lower.contains(*hint) {
                if let Some(entry) = scores.iter_mut().find(|(c, _)| c == code) {
                    entry.1 += 2;
                }
            }
        }

        // Stable sort keeps table order on ties, so English wins those.
        scores.sort_by(|a, b| b.1.cmp(&a.1));
        let (best_code, best) = scores[0];
        if best == 0 {
            return None;
        }
        let second = scores.get(1).map(|s| s.1).unwrap_or(0);

        let margin = (best - second) as f32 / best as f32;
        let coverage = (best as f32 / words.len() as f32 * 4.0).min(1.0);
        let confidence = (0.5 + 0.5 * margin) * (0.6 + 0.4 * coverage);

        Some(Detection {
            code: best_code.to_string(),
            confidence: confidence.clamp(0.0, 1.0),
        })
    }
}

impl Default for ScriptDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl LanguageDetector for ScriptDetector {
    fn detect(&self, text: &str) -> Option<Detection> {
        let counts = ScriptCounts::of(text);
        let letters = counts.letters();
        if letters == 0 {
            return None;
        }

        let candidates = [
            (counts.latin, ""),
            (counts.han + counts.kana, "cjk"),
            (counts.hangul, "ko"),
            (counts.arabic, if counts.persian > 0 { "fa" } else { "ar" }),
            (counts.hebrew, "he"),
            (counts.cyrillic, if counts.ukrainian > 0 { "uk" } else { "ru" }),
            (counts.greek, "el"),
            (counts.thai, "th"),
            (counts.devanagari, "hi"),
        ];
        let (count, code) = candidates
            .iter()
            .copied()
            .max_by_key(|(count, _)| *count)
            .unwrap_or((0, ""));
        let share = count as f32 / letters as f32;

        match code {
            "" => self.detect_latin(text).map(|mut d| {
                d.confidence *= share;
                d
            }),
            "cjk" => Some(Detection {
                code: if counts.kana > 0 { "ja" } else { "zh" }.to_string(),
                confidence: share,
            }),
            code => Some(Detection {
                code: code.to_string(),
                confidence: share,
            }),
        }
    }
}
