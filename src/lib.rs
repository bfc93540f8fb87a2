//! TransDict - Translation dictionaries for structured game text
//!
//! Exports the strings of a source document into a line-oriented dictionary,
//! machine-translates the pending entries through a pluggable provider while
//! keeping `/CONSTANT/` placeholders intact, and imports the result back.

pub mod cli;
pub mod config;
pub mod dictionary;
pub mod error;
pub mod observer;
pub mod pipeline;
pub mod source;
pub mod translate;
pub mod workflow;
