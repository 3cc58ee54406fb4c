//! Tool error types

use thiserror::Error;

/// Errors from blocking tool queries
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {program}")]
    NotFound { program: String },

    #[error("Failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Command failed: {command} (exit={}){}", fmt_exit_code(.exit_code), fmt_stderr(.stderr))]
    ExecutionFailed {
        command: String,
        exit_code: Option<i32>,
        stderr: Option<String>,
    },

    #[error("{program} timed out after {timeout_ms}ms")]
    Timeout { program: String, timeout_ms: u64 },
}

impl ToolError {
    /// Classify an error raised while creating the process
    pub fn from_spawn(program: &str, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::NotFound {
            ToolError::NotFound {
                program: program.to_string(),
            }
        } else {
            ToolError::Spawn {
                program: program.to_string(),
                source,
            }
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ToolError::NotFound { .. })
    }

    /// Exit code of a tool that ran and failed
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            ToolError::ExecutionFailed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }
}

fn fmt_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "signal".to_string(),
    }
}

fn fmt_stderr(stderr: &Option<String>) -> String {
    match stderr {
        Some(text) => format!("\n{}", text),
        None => String::new(),
    }
}
