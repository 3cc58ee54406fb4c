//! Bibliography loading and fuzzy lookup
//!
//! Entries are CSL-JSON records read from a single JSON file, either a bare
//! array or an object with an `items` array. Each entry is flattened into
//! `"<year> <surnames> <title> <id>"` and matched with `nucleo-matcher`.

mod entry;
mod error;
mod store;

pub use entry::{CitationEntry, Name};
pub use error::BibliographyError;
pub use store::{BIB_JSON_ENV, Bibliography, DEFAULT_SEARCH_LIMIT, SearchIndexEntry, resolve_path};
