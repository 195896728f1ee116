//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Planning agent prompt
pub const PLANNING: &str = include_str!("../../prompts/planning.pmt");

/// Email command classifier prompt
pub const EMAIL_COMMAND: &str = include_str!("../../prompts/email-command.pmt");

/// Scheduling agent prompt
pub const SCHEDULING: &str = include_str!("../../prompts/scheduling.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        super::PLANNING => Some(PLANNING),
        super::EMAIL_COMMAND => Some(EMAIL_COMMAND),
        super::SCHEDULING => Some(SCHEDULING),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
