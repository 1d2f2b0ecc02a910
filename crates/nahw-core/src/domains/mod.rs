//! Domain operations for the Arabic grammar learning service
//!
//! Each submodule owns one feature area: its request/response types,
//! the output schema the generator must satisfy, the prompt templates,
//! and the operations that drive the generation pipeline.

pub mod analysis;
pub mod concepts;
pub mod exercises;
pub mod quiz;
