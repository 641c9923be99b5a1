pub mod counter;
pub mod encoding;
pub mod escape;
pub mod files;
pub mod pattern;
pub mod source;
