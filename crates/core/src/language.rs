//! Language definitions for the supported languages
//!
//! The assistant answers in English, Hindi, and Marathi. Script-range
//! detection is used as a classification fallback for short or
//! code-switched input.

use serde::{Deserialize, Serialize};

/// Supported languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Marathi,
}

impl Language {
    /// Get ISO 639-1 code
    pub fn code(&self) -> &'static str {
        match self {
            Self::English => "en",
            Self::Hindi => "hi",
            Self::Marathi => "mr",
        }
    }

    /// Get human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Self::English => "English",
            Self::Hindi => "Hindi",
            Self::Marathi => "Marathi",
        }
    }

    /// Get script used by this language
    pub fn script(&self) -> Script {
        match self {
            Self::English => Script::Latin,
            Self::Hindi | Self::Marathi => Script::Devanagari,
        }
    }

    /// Parse from string (case-insensitive)
    pub fn from_str_loose(s: &str) -> Option<Self> {
        let s = s.trim().to_lowercase();
        match s.as_str() {
            "en" | "eng" | "english" => Some(Self::English),
            "hi" | "hin" | "hindi" => Some(Self::Hindi),
            "mr" | "mar" | "marathi" => Some(Self::Marathi),
            _ => None,
        }
    }

    /// Get all supported languages
    pub fn all() -> &'static [Language] {
        &[Self::English, Self::Hindi, Self::Marathi]
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Script systems relevant to classification
///
/// Non-target scripts are listed so that clearly out-of-scope input
/// (Cyrillic, Han, Arabic, ...) can be identified and rejected instead of
/// being misattributed to a supported language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Script {
    Latin,
    Devanagari,
    Cyrillic,
    Arabic,
    Han,
    Other,
}

impl Script {
    /// Get Unicode range for this script (first block only)
    pub fn unicode_range(&self) -> (u32, u32) {
        match self {
            Self::Latin => (0x0041, 0x007A),
            Self::Devanagari => (0x0900, 0x097F),
            Self::Cyrillic => (0x0400, 0x04FF),
            Self::Arabic => (0x0600, 0x06FF),
            Self::Han => (0x4E00, 0x9FFF),
            Self::Other => (0x0000, 0x0000),
        }
    }

    /// Check if an alphabetic character belongs to this script
    pub fn contains_char(&self, c: char) -> bool {
        if *self == Self::Latin {
            return c.is_ascii_alphabetic();
        }
        let code = c as u32;
        let (start, end) = self.unicode_range();
        code >= start && code <= end
    }

    /// Detect the dominant script of a text, ignoring digits, punctuation
    /// and whitespace. Returns `None` when no scriptful character is found.
    pub fn detect(text: &str) -> Option<Self> {
        let mut counts = std::collections::HashMap::new();

        for c in text.chars() {
            if !c.is_alphabetic() {
                continue;
            }
            let script = [
                Self::Devanagari,
                Self::Cyrillic,
                Self::Arabic,
                Self::Han,
                Self::Latin,
            ]
            .into_iter()
            .find(|s| s.contains_char(c))
            .unwrap_or(Self::Other);
            *counts.entry(script).or_insert(0usize) += 1;
        }

        counts.into_iter().max_by_key(|(_, v)| *v).map(|(k, _)| k)
    }

    /// Ratio of characters of this script among alphabetic characters
    pub fn ratio(&self, text: &str) -> f32 {
        let mut total = 0usize;
        let mut hits = 0usize;
        for c in text.chars() {
            if !c.is_alphabetic() {
                continue;
            }
            total += 1;
            if self.contains_char(c) {
                hits += 1;
            }
        }
        if total == 0 {
            0.0
        } else {
            hits as f32 / total as f32
        }
    }
}
