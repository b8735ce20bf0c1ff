//! Fixed user-facing messages
//!
//! The assistant always replies with *some* text; these are the replies
//! for the recoverable failure classes. Wording carried over from the
//! deployed system so existing users see familiar responses.

/// Query or answer outside the en/hi/mr allow-list
pub const UNSUPPORTED_LANGUAGE: &str = "Sorry, only Marathi, Hindi, and English are supported. \
     कृपया मराठी, हिंदी अथवा इंग्रजी भाषेत विचारा.";

/// Rate limit still hit after all retries
pub const RATE_LIMITED: &str = "Rate limit reached. Please wait a moment and try again. \
     You can also try a more specific question to reduce processing time.";

/// Request exceeded the upstream payload budget and could not be simplified
pub const QUERY_TOO_LARGE: &str = "Query too large for current model. Try asking about specific schemes \
     or categories instead of requesting all schemes at once.";

/// Upstream succeeded but produced nothing usable
pub const NO_ANSWER: &str = "I couldn't find an answer in the documents. \
     Please try rephrasing your question.";

/// Comprehensive extraction found nothing
pub const NO_SCHEMES_EXTRACTED: &str = "No government schemes were confidently extracted. The documents might \
     not contain a clear list, or the format is not recognized.";

/// Prefix for answers served from the result cache
pub const CACHED_PREFIX: &str = "[Cached] ";

/// Prefix for answers produced by the simplified degraded request
pub const SIMPLIFIED_PREFIX: &str = "[Simplified due to size limits] ";
