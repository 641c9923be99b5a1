//! Pure Pure SCN scripts.
pub mod header;
pub mod marker;
pub mod patch;
mod script;
pub mod segment;

pub use script::{ScnScript, ScnScriptBuilder, fit_strict_slot};
