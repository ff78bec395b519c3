//! Database access layer
//!
//! Key-value settings persistence for the sink (volume percentages).

pub mod settings;
