//! Comprehensive-listing expansion
//!
//! "List all schemes" style requests are answered in two phases instead
//! of one free-form generation: several alternate-phrasing retrieval
//! passes in different languages, then deterministic pattern extraction
//! over the raw responses. A single generation for "list everything"
//! truncates and paraphrases names; extraction from retrieved text does
//! not.

use std::time::Duration;

use sahayak_config::ExpansionConfig;
use sahayak_core::traits::RetrievalGenerator;

use crate::extraction::extract_scheme_names;
use crate::messages;
use crate::retry::{RetryController, RetryOutcome};

/// Case-folded substrings that mark a request as comprehensive
const COMPREHENSIVE_KEYWORDS: &[&str] = &[
    "all schemes",
    "list all",
    "list schemes",
    "complete list",
    "every scheme",
    "सर्व योजना",
    "सगळ्या योजना",
    "संपूर्ण यादी",
    "सभी योजना",
    "योजनांची यादी",
    "योजनाओं की सूची",
    "यादी",
];

/// Alternate phrasings of the listing request, one per supported
/// language, each hitting a different lexical framing of the corpus
const SUB_QUERIES: &[&str] = &[
    "Provide a comprehensive list of all government schemes, programs, and yojana mentioned in the documents.",
    "सर्व शासकीय योजना, कार्यक्रम आणि अभियानांची संपूर्ण यादी द्या.",
    "दस्तावेज़ों में उल्लिखित सभी सरकारी योजनाओं के नाम बताइए।",
];

/// Issued once when the sub-queries yield too few names
const FALLBACK_QUERY: &str =
    "What schemes, yojana, programs, missions, and initiatives are described anywhere in the documents? Name each one.";

/// Responses shorter than this, in characters, are refusals or
/// boilerplate, not worth an extraction pass
const MIN_EXTRACTABLE_CHARS: usize = 30;

pub struct ComprehensiveQueryExpander {
    inter_query_delay: Duration,
    min_results: usize,
}

impl ComprehensiveQueryExpander {
    pub fn new(config: &ExpansionConfig) -> Self {
        Self {
            inter_query_delay: Duration::from_millis(config.inter_query_delay_ms),
            min_results: config.min_results,
        }
    }

    /// Whether `query` asks for an exhaustive listing
    pub fn is_comprehensive(query: &str) -> bool {
        let folded = query.to_lowercase();
        COMPREHENSIVE_KEYWORDS.iter().any(|kw| folded.contains(kw))
    }

    /// Run the multi-query retrieval + extraction pipeline. Always
    /// returns a displayable string.
    pub async fn expand(
        &self,
        backend: &dyn RetrievalGenerator,
        retry: &RetryController,
    ) -> String {
        let mut names = Vec::new();
        let mut seen = std::collections::HashSet::new();

        for (index, sub_query) in SUB_QUERIES.iter().enumerate() {
            if index > 0 {
                tokio::time::sleep(self.inter_query_delay).await;
            }
            self.collect(backend, retry, sub_query, &mut seen, &mut names)
                .await;
        }

        if names.len() < self.min_results {
            tracing::info!(
                extracted = names.len(),
                threshold = self.min_results,
                "too few names extracted, issuing broader fallback query"
            );
            tokio::time::sleep(self.inter_query_delay).await;
            self.collect(backend, retry, FALLBACK_QUERY, &mut seen, &mut names)
                .await;
        }

        if names.is_empty() {
            return messages::NO_SCHEMES_EXTRACTED.to_string();
        }
        names.sort();
        render_scheme_list(&names)
    }

    /// One sub-query: retrieve under the retry policy, extract, merge
    /// into the running deduplicated set. Degraded responses still get
    /// an extraction pass; a failed sub-query contributes nothing but
    /// does not abort the others.
    async fn collect(
        &self,
        backend: &dyn RetrievalGenerator,
        retry: &RetryController,
        sub_query: &str,
        seen: &mut std::collections::HashSet<String>,
        names: &mut Vec<String>,
    ) {
        let outcome = retry
            .run(backend, true, || backend.invoke(sub_query))
            .await;
        let text = match &outcome {
            RetryOutcome::Answer(text) | RetryOutcome::Degraded(text) => text.as_str(),
            RetryOutcome::Failed(_) => {
                tracing::warn!(sub_query, "listing sub-query failed, continuing");
                return;
            }
        };
        if text.trim().chars().count() <= MIN_EXTRACTABLE_CHARS {
            return;
        }
        for entity in extract_scheme_names(text) {
            if seen.insert(entity.name.to_lowercase()) {
                names.push(entity.name);
            }
        }
    }
}

/// Numbered list with a count header and a caveat footer
pub fn render_scheme_list(names: &[String]) -> String {
    let mut out = format!("Found {} potential schemes:\n\n", names.len());
    for (index, name) in names.iter().enumerate() {
        out.push_str(&format!("{}. {}\n", index + 1, name));
    }
    out.push_str(
        "\nNote: This list is extracted from document content. Some names may be partial or inferred.",
    );
    out
}
