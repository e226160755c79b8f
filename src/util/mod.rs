//! Shared utilities

pub mod diagnostic;

pub use diagnostic::{Diagnostic, Severity};
