//! Text cleanup pipeline: numeric
//! citation marks, spaces, line breaks
//! and full-width characters.
//!
//! ```
//! use cleantext::{clean, CleaningConfig};
//!
//! let out = clean(
//!   "Hello [12] World",
//!   &CleaningConfig::default()
//! );
//! assert_eq!(out, "HelloWorld");
//! ```

pub mod args;
pub mod cleaner;
pub mod config;
pub mod pipeline;
pub mod rules;

pub use cleaner::{
  CleaningConfig,
  TextCleaner,
  clean
};
pub use rules::Rule;
