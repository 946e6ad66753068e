//! Lesson Catalog
//!
//! Static, ordered lesson records. The default practice sequence is the
//! first five alphabet letters followed by "Hello"; the full alphabet backs
//! letter lookup for the name-spelling game.

pub mod catalog;
pub mod language;

pub use catalog::{Catalog, Lesson, LocalizedText};
pub use language::Language;
