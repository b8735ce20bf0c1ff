//! Conversational context tracking
//!
//! Remembers the previous question/answer pair per session, detects
//! short affirmative replies ("yes", "होय", "हाँ") and rewrites them into
//! the standalone query they confirm. Follow-up offers are extracted from
//! assistant answers with a per-language regex table.
//!
//! Sessions live in a bounded store with FIFO eviction. A configurable
//! shared-session mode collapses every request onto one well-known key
//! for single-operator deployments.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use regex::Regex;
use serde::{Deserialize, Serialize};

use sahayak_config::ContextConfig;

/// Session key used when `shared_session` is on
const SHARED_SESSION_KEY: &str = "shared";

/// Topic of a suggested follow-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FollowUpTopic {
    Eligibility,
    Benefits,
    Details,
    Application,
}

impl FollowUpTopic {
    /// Map a matched keyword (any supported language) to its topic
    fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_lowercase().as_str() {
            "eligibility" | "पात्रता" => Some(Self::Eligibility),
            "benefits" | "लाभ" | "फायदे" => Some(Self::Benefits),
            "details" | "जानकारी" | "माहिती" => Some(Self::Details),
            "application" | "application process" | "आवेदन" | "अर्ज" => Some(Self::Application),
            _ => None,
        }
    }

    /// Synthesize the explicit query this topic stands for
    pub fn to_query(self, entity: &str) -> String {
        match self {
            Self::Eligibility => format!("What are the eligibility criteria for {}?", entity),
            Self::Benefits => format!("What are the benefits of {}?", entity),
            Self::Details => format!("Tell me more about {}.", entity),
            Self::Application => format!("How do I apply for {}?", entity),
        }
    }
}

/// A pending follow-up suggestion. Topic and entity are a unit; there is
/// never one without the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FollowUp {
    pub topic: FollowUpTopic,
    pub entity: String,
}

/// Per-session conversation state
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationState {
    /// What the user actually said last (the original utterance, not any
    /// synthesized rewrite)
    pub previous_question: Option<String>,
    pub last_response: Option<String>,
    pub suggestion: Option<FollowUp>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Result of affirmative resolution
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub effective_query: String,
    pub was_rewritten: bool,
}

/// Affirmative replies, matched as whole strings after case-folding,
/// trimming and stripping trailing punctuation. Substring matching would
/// turn "yes, but what about X" into a rewrite, so equality only.
const AFFIRMATIVES: &[&str] = &[
    // English
    "yes", "yeah", "yep", "yup", "sure", "ok", "okay", "yes please", "go ahead", "please do",
    "tell me",
    // Hindi (and common Roman forms)
    "हाँ", "हां", "जी", "जी हाँ", "जी हां", "ठीक है", "बताइए", "बताओ", "haan", "ha", "ji",
    // Marathi
    "हो", "होय", "हो ना", "चालेल", "सांगा",
];

struct OfferPattern {
    regex: Regex,
    topic_group: usize,
    entity_group: usize,
}

/// Per-language patterns recognizing an assistant-authored follow-up
/// offer such as "Would you like to know the eligibility of X?". Ordered;
/// first match wins. Extending language coverage means adding a row, not
/// touching control flow.
static OFFER_PATTERNS: Lazy<Vec<OfferPattern>> = Lazy::new(|| {
    vec![
        OfferPattern {
            regex: Regex::new(
                r"(?i)would you like to know (?:the |more about |about )?(eligibility|benefits|details|application process|application)(?: criteria)?\s+(?:of|for)\s+([^?.!\n]+)\?",
            )
            .expect("valid offer pattern"),
            topic_group: 1,
            entity_group: 2,
        },
        OfferPattern {
            regex: Regex::new(
                r"(?i)do you want to know (?:the |more about |about )?(eligibility|benefits|details|application process|application)(?: criteria)?\s+(?:of|for)\s+([^?.!\n]+)\?",
            )
            .expect("valid offer pattern"),
            topic_group: 1,
            entity_group: 2,
        },
        OfferPattern {
            regex: Regex::new(
                r"क्या आप\s+(.+?)\s+(?:की|के|का)\s+(पात्रता|लाभ|जानकारी|आवेदन)(?:\s+के बारे में)?\s+जानना चाहेंगे",
            )
            .expect("valid offer pattern"),
            topic_group: 2,
            entity_group: 1,
        },
        OfferPattern {
            regex: Regex::new(
                r"तुम्हाला\s+(.+?)\s+(?:ची|चे|च्या)\s+(पात्रता|फायदे|माहिती|अर्ज)\s+जाणून घ्याय(?:ची|चे) आहे का",
            )
            .expect("valid offer pattern"),
            topic_group: 2,
            entity_group: 1,
        },
    ]
});

/// Session-keyed conversation context store with FIFO eviction
pub struct ContextStore {
    inner: Mutex<StoreInner>,
    capacity: usize,
    shared_session: bool,
}

struct StoreInner {
    sessions: HashMap<String, ConversationState>,
    order: VecDeque<String>,
}

impl ContextStore {
    pub fn new(config: &ContextConfig) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                sessions: HashMap::new(),
                order: VecDeque::new(),
            }),
            capacity: config.session_capacity.max(1),
            shared_session: config.shared_session,
        }
    }

    fn key<'a>(&self, session_id: &'a str) -> &'a str {
        if self.shared_session {
            SHARED_SESSION_KEY
        } else {
            session_id
        }
    }

    /// Resolve an affirmative reply into the query it confirms. Anything
    /// that is not an affirmative, or an affirmative with no pending
    /// suggestion, passes through unchanged; "yes" with nothing to agree
    /// to is an ordinary out-of-context query.
    pub fn resolve(&self, session_id: &str, input: &str) -> Resolution {
        if !is_affirmative(input) {
            return Resolution {
                effective_query: input.to_string(),
                was_rewritten: false,
            };
        }

        let inner = self.inner.lock();
        let suggestion = inner
            .sessions
            .get(self.key(session_id))
            .and_then(|state| state.suggestion.clone());
        drop(inner);

        match suggestion {
            Some(follow_up) => {
                let effective = follow_up.topic.to_query(&follow_up.entity);
                tracing::debug!(
                    session_id,
                    topic = ?follow_up.topic,
                    entity = %follow_up.entity,
                    "resolved affirmative reply into explicit query"
                );
                Resolution {
                    effective_query: effective,
                    was_rewritten: true,
                }
            }
            None => Resolution {
                effective_query: input.to_string(),
                was_rewritten: false,
            },
        }
    }

    /// Record the latest exchange. `question` must be the original user
    /// utterance even when `resolve` rewrote it, so downstream follow-up
    /// offers reference what the human actually said. Scans `response`
    /// for a new follow-up offer; no match clears the suggestion.
    pub fn update(&self, session_id: &str, question: &str, response: &str) {
        let suggestion = extract_offer(response);
        let key = self.key(session_id).to_string();

        let mut inner = self.inner.lock();

        if !inner.sessions.contains_key(&key) {
            while inner.sessions.len() >= self.capacity {
                match inner.order.pop_front() {
                    Some(oldest) => {
                        inner.sessions.remove(&oldest);
                        tracing::debug!(evicted = %oldest, "evicted oldest conversation session");
                    }
                    None => break,
                }
            }
            inner.order.push_back(key.clone());
        }

        inner.sessions.insert(
            key,
            ConversationState {
                previous_question: Some(question.to_string()),
                last_response: Some(response.to_string()),
                suggestion,
                updated_at: Some(Utc::now()),
            },
        );
    }

    /// Snapshot of a session's state, mainly for inspection and tests
    pub fn get(&self, session_id: &str) -> Option<ConversationState> {
        self.inner.lock().sessions.get(self.key(session_id)).cloned()
    }

    /// Drop all sessions
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.sessions.clear();
        inner.order.clear();
    }

    pub fn session_count(&self) -> usize {
        self.inner.lock().sessions.len()
    }
}

/// Whole-string affirmative check after case-folding, trimming and
/// stripping trailing punctuation (Latin and Devanagari danda).
fn is_affirmative(input: &str) -> bool {
    let folded = input
        .trim()
        .trim_end_matches(['.', '!', '?', ',', '।'])
        .trim()
        .to_lowercase();
    !folded.is_empty() && AFFIRMATIVES.contains(&folded.as_str())
}

/// Scan an assistant response for a follow-up offer
fn extract_offer(response: &str) -> Option<FollowUp> {
    for pattern in OFFER_PATTERNS.iter() {
        if let Some(caps) = pattern.regex.captures(response) {
            let topic_kw = caps.get(pattern.topic_group)?.as_str();
            let entity_raw = caps.get(pattern.entity_group)?.as_str();
            let topic = FollowUpTopic::from_keyword(topic_kw)?;
            let entity = entity_raw
                .trim()
                .trim_matches(['"', '\'', '“', '”'])
                .trim_end_matches([',', ';', ':'])
                .trim()
                .to_string();
            if entity.is_empty() {
                continue;
            }
            return Some(FollowUp { topic, entity });
        }
    }
    None
}
