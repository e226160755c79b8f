//! High-level operations.
//!
//! Rules come in from disk here; everything below this layer works on an
//! already-frozen registry.

pub mod load;

pub use load::{load_rules, load_rules_dir, load_rules_file};
