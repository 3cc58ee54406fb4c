//! CLI argument parsing for citekit

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "ck")]
#[command(author, version, about = "Fuzzy bibliography lookup and citation tools", long_about = None)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Bibliography JSON file (overrides config and BIB_JSON)
    #[arg(short, long, global = true)]
    pub bib: Option<PathBuf>,

    /// Papers directory exported to the tools as PAPERS_DIR
    #[arg(long, global = true)]
    pub papers_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fuzzy search the bibliography
    Search {
        /// Free-text query; empty lists entries in file order
        #[arg(default_value = "")]
        query: String,

        /// Maximum results to return
        #[arg(short = 'n', long)]
        limit: Option<usize>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Print the path of the Markdown conversion
    MdPath {
        #[arg(required = true)]
        key: String,
    },

    /// Print the Markdown conversion
    Md {
        #[arg(required = true)]
        key: String,
    },

    /// Print the path of the PDF
    PdfPath {
        #[arg(required = true)]
        key: String,
    },

    /// Print the BibTeX entry
    Bib {
        #[arg(required = true)]
        key: String,
    },

    /// Open the Markdown conversion in VS Code
    OpenMd {
        #[arg(required = true)]
        key: String,

        /// Use VS Code Insiders
        #[arg(long)]
        insiders: bool,
    },

    /// Reveal the Markdown conversion in the file browser
    RevealMd {
        #[arg(required = true)]
        key: String,
    },

    /// Open the PDF in the default viewer
    OpenPdf {
        #[arg(required = true)]
        key: String,
    },

    /// Reveal the PDF in the file browser
    RevealPdf {
        #[arg(required = true)]
        key: String,
    },

    /// Search the LaTeX sources (arguments are passed through)
    Rg {
        /// Print one result per line
        #[arg(long)]
        lines: bool,

        #[arg(last = true, required = true)]
        args: Vec<String>,
    },

    /// List the citation keys used in a draft
    Keys {
        #[arg(required = true)]
        draft: PathBuf,
    },
}

/// Output format for search results
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "text" | "plain" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            _ => Err(format!("Unknown format: {}. Use: text or json", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Json => write!(f, "json"),
        }
    }
}
