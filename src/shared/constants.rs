/// Default Gemini model for the legal agent
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// Display name of the agent persona
pub const AGENT_NAME: &str = "IndianLegalAdvisor";

/// Persona instructions sent as the system instruction on every call
pub const AGENT_INSTRUCTIONS: &[&str] = &[
    "You are an Indian Legal Advisor AI trained on Indian laws and cyber regulations.",
    "Answer questions referencing IPC, IT Act 2000, and Cybercrime laws.",
    "Cite relevant sections and acts when possible.",
    "Clarify that you are not a lawyer and responses are for educational use only.",
    "Encourage consulting a licensed advocate for real legal advice.",
];

/// Documents ingested into the knowledge store when none are configured
pub const DEFAULT_KNOWLEDGE_SOURCES: &[&str] = &[
    // IT Act 2000
    "https://www.indiacode.nic.in/bitstream/123456789/1999/1/A2000-21%20(1).pdf",
    // IPC 1860
    "https://www.indiacode.nic.in/bitstream/123456789/4219/1/THE-INDIAN-PENAL-CODE-1860.pdf",
];

// =============================================================================
// USER-FACING MESSAGES
// =============================================================================

pub const MISSING_QUESTION_MESSAGE: &str = "Missing 'question' field";

pub const EMPTY_QUESTION_MESSAGE: &str = "Missing or empty question";

/// Console prompt shown instead of the validation error
pub const EMPTY_QUESTION_PROMPT: &str = "Please enter a question first.";

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests. Try later.";

/// Prefix for agent failures reported inside an answer
pub const AGENT_ERROR_PREFIX: &str = "⚠️ Error: ";

/// Identity used when the peer address cannot be determined
pub const UNKNOWN_CLIENT: &str = "unknown";

/// Longest question prefix written to the request log
pub const MAX_LOGGED_QUESTION_CHARS: usize = 500;
