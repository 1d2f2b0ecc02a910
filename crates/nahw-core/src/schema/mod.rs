//! Schema descriptors and the validation engine
//!
//! Parse-then-validate: generated payloads stay untyped
//! `serde_json::Value` trees until they pass validation here, and only
//! then are promoted to strongly-typed structures.

pub mod descriptor;
pub mod validator;

pub use descriptor::{Field, Schema};
pub use validator::{check, validate, Violation};
