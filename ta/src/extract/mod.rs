//! Task extraction and due date resolution
//!
//! The heart of the pipeline: plan text in, zero or one task out.

mod clarify;
pub mod due_date;
mod extractor;

pub use clarify::{ChannelClarifier, ClarificationRequest, Clarifier, ConsoleClarifier, read_line};
pub use due_date::{DueDateError, parse_due_date};
pub use extractor::{
    CLARIFICATION_NOTICE, CLARIFICATION_PROMPT, DueDateSource, Extraction, INVALID_DATE_NOTICE, TASK_MARKERS,
    TaskExtractor, find_description, split_due,
};
