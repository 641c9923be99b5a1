//! Extracting and patching the text of Pure Pure SCN scripts.
//!
//! Scripts are split into structural and translatable segments, translated
//! lines are wrapped and encoded back into them, and the size header, the
//! choice offset table and route-change jumps are fixed up afterwards.
pub mod ext;
pub mod format;
pub mod output_scripts;
pub mod pipeline;
pub mod scripts;
pub mod types;
pub mod utils;

lazy_static::lazy_static! {
    pub static ref COUNTER: utils::counter::Counter = utils::counter::Counter::new();
}
