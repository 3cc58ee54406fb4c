//! citekit - fuzzy bibliography lookup and citation tool bridge
//!
//! Two independent pieces:
//!
//! - [`bibliography`] loads a CSL-JSON bibliography and answers fuzzy
//!   queries over year, author surnames, title and citation key.
//! - [`tools`] shells out to `cite2md`, `cite2pdf`, `cite2bib` and friends to
//!   resolve a citation key to files, or to open those files.
//!
//! # Example
//!
//! ```ignore
//! use citekit::{Bibliography, ToolBridge, ToolEnvironment};
//!
//! let mut bib = Bibliography::new(None);
//! bib.load().await?;
//! let hit = bib.search("davidson 1963", 5)[0];
//!
//! let tools = ToolBridge::new(ToolEnvironment::capture());
//! if let Some(path) = tools.pdf_path(&hit.id).await? {
//!     println!("{path}");
//! }
//! ```

pub mod bibliography;
pub mod cli;
pub mod config;
pub mod tools;

pub use bibliography::{Bibliography, BibliographyError, CitationEntry, DEFAULT_SEARCH_LIMIT};
pub use config::Config;
pub use tools::{ActionResult, ToolBridge, ToolEnvironment, ToolError, ToolPrograms};
