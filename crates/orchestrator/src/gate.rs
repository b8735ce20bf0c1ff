//! Language gate
//!
//! Classifies free text and enforces the language allow-list before any
//! expensive work happens. Applied twice per request: once on the inbound
//! query, once on the generated answer (protects against the upstream
//! generator drifting into an unsupported language).
//!
//! A hard reject on low classifier confidence alone produces too many
//! false negatives for code-switched or transliterated input, so low
//! confidence falls back to script-range detection plus a small lexicon
//! of common function words before rejecting.

use std::sync::Arc;

use sahayak_config::LanguageConfig;
use sahayak_core::{Classification, Language, LanguageClassifier, Script};

/// Common function words per language, used by the heuristic fallback.
/// Includes Roman-Hindi forms so transliterated input is not rejected.
const ENGLISH_LEXICON: &[&str] = &[
    "the", "is", "are", "what", "how", "which", "who", "for", "of", "and", "to", "in", "scheme",
    "schemes", "list", "all", "yes",
];
const HINDI_LEXICON: &[&str] = &[
    "है", "हैं", "क्या", "कैसे", "कौन", "और", "के", "की", "का", "में", "योजना", "सभी", "हाँ",
    "kya", "kaise", "yojana", "haan",
];
const MARATHI_LEXICON: &[&str] = &[
    "आहे", "आहेत", "काय", "कसे", "कोण", "आणि", "च्या", "ची", "चे", "मध्ये", "योजना", "सर्व",
    "होय", "यादी", "माहिती",
];

/// Gate verdict for a piece of text
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    pub allowed: bool,
    /// Language the gate settled on; `None` when the text passed
    /// unclassified (too short) or was rejected without a supported match
    pub language: Option<Language>,
    pub confidence: f32,
}

impl GateDecision {
    fn allow(language: Option<Language>, confidence: f32) -> Self {
        Self {
            allowed: true,
            language,
            confidence,
        }
    }

    fn reject(confidence: f32) -> Self {
        Self {
            allowed: false,
            language: None,
            confidence,
        }
    }
}

/// Script-range + lexicon classifier, the default when no statistical
/// classifier is plugged in
pub struct ScriptClassifier;

impl ScriptClassifier {
    /// Distinguish Hindi from Marathi inside Devanagari text by counting
    /// lexicon hits; ties default to Hindi (the larger speaker base).
    fn devanagari_language(text: &str) -> (Language, f32) {
        let lower = text.to_lowercase();
        let hindi_hits = HINDI_LEXICON.iter().filter(|w| contains_word(&lower, w)).count();
        let marathi_hits = MARATHI_LEXICON
            .iter()
            .filter(|w| contains_word(&lower, w))
            .count();

        if marathi_hits > hindi_hits {
            (Language::Marathi, confidence_from_hits(marathi_hits))
        } else {
            (Language::Hindi, confidence_from_hits(hindi_hits.max(1)))
        }
    }
}

fn confidence_from_hits(hits: usize) -> f32 {
    (0.5 + 0.15 * hits as f32).min(0.95)
}

fn contains_word(text: &str, word: &str) -> bool {
    text.split(|c: char| !c.is_alphanumeric()).any(|t| t == word)
}

impl LanguageClassifier for ScriptClassifier {
    fn classify(&self, text: &str) -> Classification {
        match Script::detect(text) {
            Some(Script::Devanagari) => {
                let ratio = Script::Devanagari.ratio(text);
                let (language, lex_conf) = Self::devanagari_language(text);
                Classification::new(language.code(), ratio.min(lex_conf))
            }
            Some(Script::Latin) => {
                let ratio = Script::Latin.ratio(text);
                let lower = text.to_lowercase();
                let en_hits = ENGLISH_LEXICON.iter().filter(|w| contains_word(&lower, w)).count();
                let hinglish_hits = HINDI_LEXICON
                    .iter()
                    .chain(MARATHI_LEXICON.iter())
                    .filter(|w| contains_word(&lower, w))
                    .count();
                if hinglish_hits > en_hits {
                    Classification::new("hi", ratio * confidence_from_hits(hinglish_hits))
                } else {
                    Classification::new("en", ratio * confidence_from_hits(en_hits.max(1)))
                }
            }
            Some(Script::Cyrillic) => Classification::new("ru", 0.9),
            Some(Script::Arabic) => Classification::new("ur", 0.9),
            Some(Script::Han) => Classification::new("zh", 0.9),
            _ => Classification::new("und", 0.0),
        }
    }
}

/// Allow-list enforcement around a pluggable classifier
pub struct LanguageGate {
    classifier: Arc<dyn LanguageClassifier>,
    allowed: Vec<Language>,
    min_classify_chars: usize,
    confidence_threshold: f32,
}

impl LanguageGate {
    pub fn new(config: &LanguageConfig, classifier: Arc<dyn LanguageClassifier>) -> Self {
        Self {
            classifier,
            allowed: config.allowed_languages(),
            min_classify_chars: config.min_classify_chars,
            confidence_threshold: config.confidence_threshold,
        }
    }

    /// Gate with the built-in script classifier
    pub fn with_defaults(config: &LanguageConfig) -> Self {
        Self::new(config, Arc::new(ScriptClassifier))
    }

    pub fn is_allowed(&self, language: Language) -> bool {
        self.allowed.contains(&language)
    }

    /// Classify and check `text` against the allow-list
    pub fn check(&self, text: &str) -> GateDecision {
        // Very short input always passes unclassified; blocking valid
        // short queries costs more than letting a short stray through.
        let significant: usize = text.chars().filter(|c| c.is_alphanumeric()).count();
        if significant < self.min_classify_chars {
            return GateDecision::allow(None, 0.0);
        }

        let classification = self.classifier.classify(text);

        if classification.confidence >= self.confidence_threshold {
            return match classification.language() {
                Some(lang) if self.is_allowed(lang) => {
                    GateDecision::allow(Some(lang), classification.confidence)
                }
                _ => GateDecision::reject(classification.confidence),
            };
        }

        // Low confidence: script-range + lexicon fallback before rejecting
        self.heuristic_fallback(text, classification.confidence)
    }

    fn heuristic_fallback(&self, text: &str, classifier_confidence: f32) -> GateDecision {
        match Script::detect(text) {
            Some(Script::Devanagari) => {
                let (language, confidence) = ScriptClassifier::devanagari_language(text);
                if self.is_allowed(language) {
                    GateDecision::allow(Some(language), confidence)
                } else {
                    GateDecision::reject(confidence)
                }
            }
            Some(Script::Latin) => {
                let lower = text.to_lowercase();
                let known_word = ENGLISH_LEXICON
                    .iter()
                    .chain(HINDI_LEXICON.iter())
                    .chain(MARATHI_LEXICON.iter())
                    .any(|w| contains_word(&lower, w));
                if known_word && self.is_allowed(Language::English) {
                    GateDecision::allow(Some(Language::English), 0.5)
                } else {
                    GateDecision::reject(classifier_confidence)
                }
            }
            _ => GateDecision::reject(classifier_confidence),
        }
    }
}
