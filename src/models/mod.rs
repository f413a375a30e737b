//! Core data structures for citation-graph works.

mod work;

pub use work::{DisplayName, RawTopic, RawWork, Work};
