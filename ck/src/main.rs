use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use tracing::debug;

use citekit::cli::{Cli, Command, OutputFormat};
use citekit::config::Config;
use citekit::tools::{ActionResult, ToolEnvironment};
use citekit::CitationEntry;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Priority: CLI --log-level > config file > RUST_LOG / INFO
    let filter = match cli_log_level.or(config_log_level) {
        Some(level) => tracing_subscriber::EnvFilter::try_new(level.to_lowercase())
            .context(format!("Invalid log level: {}", level))?,
        None => tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
    Ok(())
}

fn print_entry(entry: &CitationEntry) {
    let year = entry.year().unwrap_or_default();
    println!(
        "{} {} {} {}",
        entry.id.cyan(),
        year.yellow(),
        entry.surnames().green(),
        entry.title_text()
    );
}

fn print_optional(value: Option<String>) {
    if let Some(text) = value {
        println!("{}", text);
    }
}

fn report(result: ActionResult) -> Result<()> {
    if result.ok {
        println!("{} Launched", "✓".green());
        Ok(())
    } else {
        Err(eyre::eyre!(result.error.unwrap_or_else(|| "Failed to launch tool".to_string())))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    setup_logging(cli.log_level.as_deref(), config.log_level.as_deref()).context("Failed to setup logging")?;

    debug!(?cli, "ck starting");

    let tools = || config.tools.bridge(ToolEnvironment::capture(), cli.papers_dir.clone());

    match cli.command {
        Command::Search { ref query, limit, ref format } => {
            let mut bib = config.bibliography.bibliography(cli.bib.clone());
            bib.load().await?;

            let results = bib.search(query, limit.unwrap_or(config.bibliography.search_limit));
            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&results)?),
                OutputFormat::Text => {
                    for entry in results {
                        print_entry(entry);
                    }
                }
            }
        }
        Command::MdPath { ref key } => print_optional(tools().md_path(key).await?),
        Command::Md { ref key } => print_optional(tools().md_content(key).await?),
        Command::PdfPath { ref key } => print_optional(tools().pdf_path(key).await?),
        Command::Bib { ref key } => print_optional(tools().bib_entry(key).await?),
        Command::OpenMd { ref key, insiders } => {
            let bridge = tools();
            let result = if insiders {
                bridge.open_vscode_insiders(key).await
            } else {
                bridge.open_vscode(key).await
            };
            report(result)?;
        }
        Command::RevealMd { ref key } => report(tools().reveal_md(key).await)?,
        Command::OpenPdf { ref key } => report(tools().open_pdf(key).await)?,
        Command::RevealPdf { ref key } => report(tools().reveal_pdf(key).await)?,
        Command::Rg { lines, ref args } => {
            let bridge = tools();
            if lines {
                for line in bridge.rg_sources_lines(args.as_slice()).await? {
                    println!("{}", line);
                }
            } else {
                print_optional(bridge.rg_sources(args.as_slice()).await?);
            }
        }
        Command::Keys { ref draft } => {
            for key in tools().keys_from_draft(draft).await? {
                println!("{}", key);
            }
        }
    }

    Ok(())
}
