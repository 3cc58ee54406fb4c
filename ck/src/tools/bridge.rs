//! Bridge to the cite2md / cite2pdf / cite2bib command-line tools

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use super::action::ActionResult;
use super::environment::ToolEnvironment;
use super::error::ToolError;
use super::runner::{CommandOutput, CommandRunner, Invocation, ProcessRunner};

/// Names (or paths) of the external executables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolPrograms {
    pub cite2md: String,

    pub cite2pdf: String,

    pub cite2bib: String,

    /// Line-oriented search over the LaTeX sources
    #[serde(rename = "rg-sources")]
    pub rg_sources: String,

    /// Lists the citation keys used in a draft
    pub draft2keys: String,
}

impl Default for ToolPrograms {
    fn default() -> Self {
        Self {
            cite2md: "cite2md".to_string(),
            cite2pdf: "cite2pdf".to_string(),
            cite2bib: "cite2bib".to_string(),
            rg_sources: "rg-sources".to_string(),
            draft2keys: "draft2keys".to_string(),
        }
    }
}

/// Runs the citation tools with a fixed environment
///
/// Query methods wait for the tool and return its trimmed stdout, or `None`
/// when it printed nothing. Action methods start the tool detached and only
/// report whether it could be started.
#[derive(Clone)]
pub struct ToolBridge {
    env: ToolEnvironment,
    programs: ToolPrograms,
    runner: Arc<dyn CommandRunner>,
    timeout: Option<Duration>,
}

impl std::fmt::Debug for ToolBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolBridge")
            .field("programs", &self.programs)
            .field("env_vars", &self.env.len())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ToolBridge {
    pub fn new(env: ToolEnvironment) -> Self {
        debug!(papers_dir = ?env.papers_dir(), "ToolBridge::new: called");
        Self {
            env,
            programs: ToolPrograms::default(),
            runner: Arc::new(ProcessRunner),
            timeout: None,
        }
    }

    pub fn with_programs(mut self, programs: ToolPrograms) -> Self {
        self.programs = programs;
        self
    }

    pub fn with_runner(mut self, runner: Arc<dyn CommandRunner>) -> Self {
        self.runner = runner;
        self
    }

    /// Give up on query calls after `timeout`; `None` waits indefinitely
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn environment(&self) -> &ToolEnvironment {
        &self.env
    }

    pub fn programs(&self) -> &ToolPrograms {
        &self.programs
    }

    /// Path of the Markdown conversion for `key`
    pub async fn md_path(&self, key: &str) -> Result<Option<String>, ToolError> {
        self.query(Invocation::new(&self.programs.cite2md, [key])).await
    }

    /// Full text of the Markdown conversion for `key`
    pub async fn md_content(&self, key: &str) -> Result<Option<String>, ToolError> {
        self.query(Invocation::new(&self.programs.cite2md, ["--cat", key])).await
    }

    pub async fn pdf_path(&self, key: &str) -> Result<Option<String>, ToolError> {
        self.query(Invocation::new(&self.programs.cite2pdf, [key])).await
    }

    /// Raw BibTeX entry for `key`
    pub async fn bib_entry(&self, key: &str) -> Result<Option<String>, ToolError> {
        self.query(Invocation::new(&self.programs.cite2bib, [key])).await
    }

    pub async fn open_vscode(&self, key: &str) -> ActionResult {
        self.action(Invocation::new(&self.programs.cite2md, ["--vs", key])).await
    }

    pub async fn open_vscode_insiders(&self, key: &str) -> ActionResult {
        self.action(Invocation::new(&self.programs.cite2md, ["--vsi", key])).await
    }

    /// Show the Markdown file in the system file browser
    pub async fn reveal_md(&self, key: &str) -> ActionResult {
        self.action(Invocation::new(&self.programs.cite2md, ["--reveal", key])).await
    }

    /// Open the PDF in the default viewer
    pub async fn open_pdf(&self, key: &str) -> ActionResult {
        self.action(Invocation::new(&self.programs.cite2pdf, ["--open", key])).await
    }

    pub async fn reveal_pdf(&self, key: &str) -> ActionResult {
        self.action(Invocation::new(&self.programs.cite2pdf, ["--reveal", key])).await
    }

    /// Run the source search tool, returning its trimmed output
    pub async fn rg_sources<S: AsRef<str>>(&self, args: &[S]) -> Result<Option<String>, ToolError> {
        self.query(self.rg_invocation(args)).await
    }

    /// Run the source search tool and split its output into lines
    ///
    /// Only the final line terminator is dropped; whitespace inside lines is kept.
    pub async fn rg_sources_lines<S: AsRef<str>>(&self, args: &[S]) -> Result<Vec<String>, ToolError> {
        let output = self.capture(&self.rg_invocation(args)).await?;
        if output.stdout.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(output.stdout.lines().map(str::to_string).collect())
    }

    /// Citation keys referenced by a draft, one per non-blank output line
    pub async fn keys_from_draft(&self, draft: impl AsRef<Path>) -> Result<Vec<String>, ToolError> {
        let draft = draft.as_ref().to_string_lossy().into_owned();
        let output = self
            .capture(&Invocation::new(&self.programs.draft2keys, [draft]))
            .await?;

        Ok(output
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn rg_invocation<S: AsRef<str>>(&self, args: &[S]) -> Invocation {
        Invocation::new(&self.programs.rg_sources, args.iter().map(|a| a.as_ref().to_string()))
    }

    async fn query(&self, invocation: Invocation) -> Result<Option<String>, ToolError> {
        let output = self.capture(&invocation).await?;
        let trimmed = output.stdout.trim();
        Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
    }

    async fn capture(&self, invocation: &Invocation) -> Result<CommandOutput, ToolError> {
        debug!(command = %invocation.command_line(), "ToolBridge::capture: called");

        let run = self.runner.run(invocation, &self.env);
        let result = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, run).await.map_err(|_| {
                debug!("ToolBridge::capture: timed out");
                ToolError::Timeout {
                    program: invocation.program.clone(),
                    timeout_ms: timeout.as_millis() as u64,
                }
            })?,
            None => run.await,
        };
        let output = result.map_err(|e| ToolError::from_spawn(&invocation.program, e))?;

        if !output.success {
            debug!(exit_code = ?output.exit_code, "ToolBridge::capture: tool failed");
            let stderr = output.stderr.trim();
            return Err(ToolError::ExecutionFailed {
                command: invocation.command_line(),
                exit_code: output.exit_code,
                stderr: (!stderr.is_empty()).then(|| stderr.to_string()),
            });
        }

        Ok(output)
    }

    async fn action(&self, invocation: Invocation) -> ActionResult {
        match self.runner.launch(&invocation, &self.env).await {
            Ok(()) => ActionResult::success(),
            Err(e) => {
                let err = ToolError::from_spawn(&invocation.program, e);
                warn!(command = %invocation.command_line(), error = %err, "Failed to launch tool");
                ActionResult::failure(err.to_string())
            }
        }
    }
}
