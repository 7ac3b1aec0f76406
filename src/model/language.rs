//! Language and writing-system annotations.

use serde::{Deserialize, Serialize};

/// Script directionality class of a piece of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WritingSystem {
    /// Left-to-right scripts (Latin, Cyrillic, Greek, ...)
    #[default]
    Ltr,
    /// Right-to-left scripts (Arabic, Hebrew, Syriac, ...)
    Rtl,
    /// Chinese, Japanese or Korean
    Cjk,
    /// Right-to-left text interleaved with Latin
    Mixed,
}

impl WritingSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            WritingSystem::Ltr => "ltr",
            WritingSystem::Rtl => "rtl",
            WritingSystem::Cjk => "cjk",
            WritingSystem::Mixed => "mixed",
        }
    }

    /// Most common language for the script class, used when detection abstains.
    pub fn default_language(&self) -> &'static str {
        match self {
            WritingSystem::Rtl => "ar",
            WritingSystem::Cjk => "zh",
            WritingSystem::Ltr | WritingSystem::Mixed => "en",
        }
    }
}

impl std::fmt::Display for WritingSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Language annotation attached to blocks and table cells.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageInfo {
    /// ISO 639-1 code, or `unknown`
    pub code: String,
    /// Human readable language name
    pub name: String,
    /// Detector confidence in `[0, 1]`
    pub confidence: f32,
    pub writing_system: WritingSystem,
    pub encoding: String,
}

impl LanguageInfo {
    /// Annotation for text too short to classify.
    pub fn unknown() -> Self {
        Self {
            code: UNKNOWN_LANGUAGE.to_string(),
            name: "Unknown".to_string(),
            confidence: 0.0,
            writing_system: WritingSystem::Ltr,
            encoding: "utf-8".to_string(),
        }
    }

    pub fn new(code: &str, confidence: f32, writing_system: WritingSystem) -> Self {
        Self {
            code: code.to_string(),
            name: language_name(code),
            confidence,
            writing_system,
            encoding: "utf-8".to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.code == UNKNOWN_LANGUAGE
    }
}

impl Default for LanguageInfo {
    fn default() -> Self {
        Self::unknown()
    }
}

/// Code used when no language could be determined.
pub const UNKNOWN_LANGUAGE: &str = "unknown";

const LANGUAGE_NAMES: &[(&str, &str)] = &[
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("cs", "Czech"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("fa", "Persian"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("he", "Hebrew"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("it", "Italian"),
    ("ja", "Japanese"),
    ("ko", "Korean"),
    ("ms", "Malay"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pl", "Polish"),
    ("pt", "Portuguese"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("sk", "Slovak"),
    ("sl", "Slovenian"),
    ("sr", "Serbian"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("th", "Thai"),
    ("tl", "Tagalog"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("vi", "Vietnamese"),
    ("zh", "Chinese"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
];

/// Display name for an ISO 639-1 code; unknown codes are upper-cased.
pub fn language_name(code: &str) -> String {
    if code == UNKNOWN_LANGUAGE {
        return "Unknown".to_string();
    }
    let lower = code.to_lowercase();
    LANGUAGE_NAMES
        .iter()
        .find(|(c, _)| *c == lower)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| code.to_uppercase())
}
