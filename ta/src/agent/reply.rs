//! Tagged result of a completion-backed call

use colored::Colorize;
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, CompletionResponse, LlmClient, LlmError};

/// Outcome of asking the completion service for something
///
/// Callers map both failure variants to the same default; they are kept
/// apart only so the log says which one happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceReply<T> {
    /// The service answered with usable content
    Ok(T),
    /// The service answered, but without the expected content
    Malformed(String),
    /// The request never produced a response
    TransportFailure(String),
}

impl<T> ServiceReply<T> {
    /// Collapse both failure variants into `None`
    pub fn ok(self) -> Option<T> {
        match self {
            ServiceReply::Ok(value) => Some(value),
            ServiceReply::Malformed(_) | ServiceReply::TransportFailure(_) => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ServiceReply<U> {
        match self {
            ServiceReply::Ok(value) => ServiceReply::Ok(f(value)),
            ServiceReply::Malformed(reason) => ServiceReply::Malformed(reason),
            ServiceReply::TransportFailure(reason) => ServiceReply::TransportFailure(reason),
        }
    }
}

impl ServiceReply<String> {
    /// Classify a raw client result
    pub fn from_result(result: Result<CompletionResponse, LlmError>) -> Self {
        match result {
            Ok(response) => match response.content {
                Some(content) => ServiceReply::Ok(content),
                None => ServiceReply::Malformed("response has no content".to_string()),
            },
            Err(e) if e.is_transport() => ServiceReply::TransportFailure(e.to_string()),
            Err(e) => ServiceReply::Malformed(e.to_string()),
        }
    }
}

/// Console line for a failed call, `None` when the call produced content
///
/// Only a reply without `choices` (or without content) gets the
/// "'choices' not found" wording; HTTP errors keep their status text.
fn failure_notice(result: &Result<CompletionResponse, LlmError>) -> Option<String> {
    match result {
        Ok(response) if response.content.is_some() => None,
        Ok(_) | Err(LlmError::MissingChoices) => Some("Error: 'choices' not found in the response.".to_string()),
        Err(e) if e.is_transport() => Some(format!("Request failed: {}", e)),
        Err(e) => Some(format!("Error: {}", e)),
    }
}

/// Send `request` and report failures on the console
///
/// `agent` names the caller in log lines and console notices.
pub(crate) async fn complete_text(llm: &dyn LlmClient, request: CompletionRequest, agent: &str) -> ServiceReply<String> {
    debug!(%agent, model = %llm.model(), "complete_text: called");
    let result = llm.complete(request).await;

    if let Ok(response) = &result {
        debug!(
            %agent,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            stop_reason = ?response.stop_reason,
            "complete_text: usage"
        );
        if response.stop_reason.is_incomplete() {
            warn!(%agent, stop_reason = ?response.stop_reason, "complete_text: response cut short");
            println!(
                "{}",
                format!("Warning: {} response was cut short ({:?}).", agent, response.stop_reason).yellow()
            );
        }
    }
    let notice = failure_notice(&result);

    let reply = ServiceReply::from_result(result);
    match &reply {
        ServiceReply::Ok(content) => debug!(%agent, len = content.len(), "complete_text: content received"),
        ServiceReply::Malformed(reason) => warn!(%agent, %reason, "complete_text: malformed response"),
        ServiceReply::TransportFailure(reason) => warn!(%agent, %reason, "complete_text: request failed"),
    }
    if let Some(notice) = notice {
        println!("{}", notice.red());
    }
    reply
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use std::time::Duration;

    #[test]
    fn test_from_result_content() {
        let reply = ServiceReply::from_result(Ok(CompletionResponse::text("hello")));
        assert_eq!(reply, ServiceReply::Ok("hello".to_string()));
    }

    #[test]
    fn test_from_result_missing_content_is_malformed() {
        let mut response = CompletionResponse::text("");
        response.content = None;
        assert!(matches!(ServiceReply::from_result(Ok(response)), ServiceReply::Malformed(_)));
    }

    #[test]
    fn test_from_result_missing_choices_is_malformed() {
        let reply = ServiceReply::from_result(Err(LlmError::MissingChoices));
        assert!(matches!(reply, ServiceReply::Malformed(_)));
        assert_eq!(reply.ok(), None);
    }

    #[test]
    fn test_map_preserves_failure() {
        let reply: ServiceReply<String> = ServiceReply::TransportFailure("down".to_string());
        assert_eq!(reply.map(|s| s.len()), ServiceReply::TransportFailure("down".to_string()));
    }

    #[test]
    fn test_failure_notice_none_for_content() {
        assert_eq!(failure_notice(&Ok(CompletionResponse::text("hi"))), None);
    }

    #[test]
    fn test_failure_notice_missing_choices() {
        let expected = Some("Error: 'choices' not found in the response.".to_string());
        assert_eq!(failure_notice(&Err(LlmError::MissingChoices)), expected);

        let mut response = CompletionResponse::text("");
        response.content = None;
        assert_eq!(failure_notice(&Ok(response)), expected);
    }

    #[test]
    fn test_failure_notice_keeps_http_error_text() {
        let unauthorized = Err(LlmError::ApiError {
            status: 401,
            message: "Invalid API key".to_string(),
        });
        let notice = failure_notice(&unauthorized).unwrap();
        assert_eq!(notice, "Error: API error 401: Invalid API key");
        assert!(!notice.contains("choices"));

        let limited = Err(LlmError::RateLimited {
            retry_after: Duration::from_secs(30),
        });
        let notice = failure_notice(&limited).unwrap();
        assert!(notice.starts_with("Error: Rate limited"));
        assert!(!notice.contains("choices"));
    }

    #[tokio::test]
    async fn test_complete_text_truncated_reply_still_ok() {
        let mock = MockLlmClient::new(vec![MockReply::Truncated("2025-03-01 10:".to_string())]);
        let request = CompletionRequest::single_turn("q", "s", 10);
        let reply = complete_text(&mock, request, "Scheduler").await;
        assert_eq!(reply, ServiceReply::Ok("2025-03-01 10:".to_string()));
    }

    #[tokio::test]
    async fn test_complete_text_missing_choices_is_malformed() {
        let mock = MockLlmClient::new(vec![MockReply::MissingChoices]);
        let request = CompletionRequest::single_turn("q", "s", 10);
        let reply = complete_text(&mock, request, "Planner").await;
        assert!(matches!(reply, ServiceReply::Malformed(_)));
    }
}
