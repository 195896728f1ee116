//! Domain types
//!
//! A task is the only record this system creates; the task list is an
//! ordered `Vec<Task>` in creation order.

mod task;

pub use task::{CANONICAL_FORMAT, DueDate, NOT_SPECIFIED, Task, TaskList, is_calendar_timestamp};
