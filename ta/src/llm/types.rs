//! Completion request/response types
//!
//! Provider-agnostic shapes; each client maps them onto its own wire format.

use tracing::debug;

/// A completion request - everything needed for one call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletionRequest {
    /// System prompt (rendered from a Handlebars template)
    pub system_prompt: String,

    /// The single user turn
    pub user_message: String,

    /// Max tokens for the response
    pub max_tokens: u32,
}

impl CompletionRequest {
    /// Single-turn request: one user message plus a system prompt
    pub fn single_turn(user: impl Into<String>, system_prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user.into(),
            max_tokens,
        }
    }
}

/// Response from a completion request
#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Text content of the first choice (if any)
    pub content: Option<String>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response, used by tests and mocks
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        }
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    ContentFilter,
}

impl StopReason {
    /// Parse from an OpenAI `finish_reason`
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("length") => StopReason::MaxTokens,
            Some("content_filter") => StopReason::ContentFilter,
            _ => StopReason::EndTurn,
        }
    }

    /// The content stops short of what the model meant to say
    pub fn is_incomplete(self) -> bool {
        !matches!(self, StopReason::EndTurn)
    }
}

/// Token usage
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_turn_request() {
        let req = CompletionRequest::single_turn("query", "system", 100);
        assert_eq!(req.user_message, "query");
        assert_eq!(req.system_prompt, "system");
        assert_eq!(req.max_tokens, 100);
    }

    #[test]
    fn test_stop_reason_from_openai() {
        assert_eq!(StopReason::from_openai(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_openai(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_openai(Some("content_filter")), StopReason::ContentFilter);
        assert_eq!(StopReason::from_openai(None), StopReason::EndTurn);
    }

    #[test]
    fn test_incomplete_stop_reasons() {
        assert!(!StopReason::EndTurn.is_incomplete());
        assert!(StopReason::MaxTokens.is_incomplete());
        assert!(StopReason::ContentFilter.is_incomplete());
    }
}
