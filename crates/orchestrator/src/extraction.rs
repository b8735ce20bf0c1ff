//! Multilingual scheme-name extraction
//!
//! A single free-form generation for "list everything" truncates and
//! paraphrases names, so comprehensive answers are built by running
//! deterministic pattern extraction over raw retrieved text instead.
//!
//! The patterns live in an ordered data table of (regex, capture group)
//! rows per construction: keyword-adjacent capitalized phrases, named
//! title prefixes, acronym schemes, and numbered/bulleted list items in
//! both Latin and Devanagari. Extending coverage means adding a row.

use once_cell::sync::Lazy;
use regex::Regex;

/// A scheme/program name pulled out of retrieved text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntity {
    /// Normalized display name
    pub name: String,
    /// Raw text fragment the name was extracted from
    pub source_fragment: String,
}

struct PatternRow {
    regex: Regex,
    /// Capture group holding the name; 0 means the whole match
    capture: usize,
}

static PATTERNS: Lazy<Vec<PatternRow>> = Lazy::new(|| {
    vec![
        // Capitalized Latin phrase ending in a scheme keyword. The prefix
        // stays case-sensitive so lowercase sentence words are not pulled
        // into the name; only the keyword folds case.
        PatternRow {
            regex: Regex::new(
                r"\b[A-Z][\w'-]+(?: [A-Z][\w'-]+)* (?i:योजना|कार्यक्रम|अभियान|मिशन|धोरण|निधी|कार्ड|Scheme|Yojana|Programme|Abhiyan|Mission|Initiative|Program|Policy|Fund|Card)\b",
            )
            .expect("valid extraction pattern"),
            capture: 0,
        },
        // Devanagari phrase ending in a Devanagari scheme keyword
        PatternRow {
            regex: Regex::new(
                r"\b(?:\p{Devanagari}+ ){1,5}(?:योजना|कार्यक्रम|अभियान|मिशन|धोरण|निधी|कार्ड)\b",
            )
            .expect("valid extraction pattern"),
            capture: 0,
        },
        // Names opening with a government title prefix
        PatternRow {
            regex: Regex::new(
                r"\b(?:Pradhan Mantri|Mukhyamantri|CM|PM|National|Rashtriya|State|Rajya|प्रधानमंत्री|मुख्यमंत्री|राष्ट्रीय|राज्य) (?:[A-Z][\w'-]+ ?)+",
            )
            .expect("valid extraction pattern"),
            capture: 0,
        },
        // Lowercase fold of the title-prefix row, for uncased generated
        // text; all-lowercase continuation words only
        PatternRow {
            regex: Regex::new(
                r"\b(?i:pradhan mantri|mukhyamantri|rashtriya|rajya) (?:[a-z][\w'-]* ?)+",
            )
            .expect("valid extraction pattern"),
            capture: 0,
        },
        // Acronym schemes like "JSY Scheme"
        PatternRow {
            regex: Regex::new(r"\b[A-Z]{2,}(?:-[A-Z]{2,})? Scheme\b")
                .expect("valid extraction pattern"),
            capture: 0,
        },
        // Numbered list items (ASCII and Devanagari digits)
        PatternRow {
            regex: Regex::new(
                r"(?:[०-९]+|[0-9]+)\.\s+((?:[A-Z]|\p{Devanagari})[\w\s'-]+(?i:योजना|Scheme|कार्यक्रम|Karyakram|अभियान|Abhiyan))",
            )
            .expect("valid extraction pattern"),
            capture: 1,
        },
        // Bulleted list items
        PatternRow {
            regex: Regex::new(
                r"•\s+((?:[A-Z]|\p{Devanagari})[\w\s'-]+(?i:योजना|Scheme|कार्यक्रम|Karyakram|अभियान|Abhiyan))",
            )
            .expect("valid extraction pattern"),
            capture: 1,
        },
    ]
});

/// Extract scheme names from retrieved text. Results are normalized,
/// deduplicated on the case-normalized punctuation-stripped name, and
/// sorted for stable rendering.
pub fn extract_scheme_names(text: &str) -> Vec<ExtractedEntity> {
    // Collapse whitespace so patterns spanning line breaks still match
    let flattened = text.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut seen = std::collections::HashSet::new();
    let mut entities = Vec::new();

    for row in PATTERNS.iter() {
        for caps in row.regex.captures_iter(&flattened) {
            let m = match caps.get(row.capture) {
                Some(m) => m,
                None => continue,
            };
            let Some(name) = normalize_name(m.as_str()) else {
                continue;
            };
            if seen.insert(dedup_key(&name)) {
                entities.push(ExtractedEntity {
                    name,
                    source_fragment: m.as_str().to_string(),
                });
            }
        }
    }

    entities.sort_by(|a, b| a.name.cmp(&b.name));
    entities
}

/// Trim, strip trailing punctuation, title-case, and sanity-check length.
/// Rejects fragments under 5 characters or at 10 or more words.
fn normalize_name(raw: &str) -> Option<String> {
    let cleaned = raw.trim().trim_end_matches(['.', ',', ':', ';', '-']).trim();
    let titled = title_case(cleaned);
    if titled.chars().count() <= 4 || titled.split_whitespace().count() >= 10 {
        return None;
    }
    Some(titled)
}

/// Uppercase the first letter of each word, lowercase the rest. A no-op
/// for Devanagari, which has no case.
fn title_case(text: &str) -> String {
    text.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => {
                    first.to_uppercase().collect::<String>()
                        + &chars.flat_map(char::to_lowercase).collect::<String>()
                }
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Key for deduplication: lowercased with all punctuation removed
fn dedup_key(name: &str) -> String {
    name.to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
