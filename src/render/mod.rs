//! Rendering of command results for the terminal and for programs.

mod json;
mod report;

pub use json::{JsonFormat, Response};
pub use report::{MistakeReport, NO_MISTAKES};
