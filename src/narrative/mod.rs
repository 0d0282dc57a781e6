//! Narrative report generation.
//!
//! Hands the assembled report data to an LLM and returns its prose.

pub mod client;
pub mod prompt;

pub use client::{NarrativeClient, NarrativeConfig};
