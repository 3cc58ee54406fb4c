//! Process execution seam

use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::debug;

use super::environment::ToolEnvironment;

/// A program and its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
}

impl Invocation {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Space-joined command line, for messages only
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Captured result of a finished process
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// A successful exit with the given stdout
    pub fn stdout(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            success: true,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// A failed exit with the given code and stderr
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            success: false,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }
}

/// Runs external programs on behalf of the bridge
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run to completion and capture stdout/stderr
    async fn run(&self, invocation: &Invocation, env: &ToolEnvironment) -> std::io::Result<CommandOutput>;

    /// Start detached and return once the process exists; never waits for exit
    async fn launch(&self, invocation: &Invocation, env: &ToolEnvironment) -> std::io::Result<()>;
}

/// `CommandRunner` backed by real child processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl ProcessRunner {
    fn command(invocation: &Invocation, env: &ToolEnvironment) -> std::process::Command {
        let mut cmd = std::process::Command::new(&invocation.program);
        cmd.args(&invocation.args).env_clear().envs(env.iter()).stdin(Stdio::null());
        cmd
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, invocation: &Invocation, env: &ToolEnvironment) -> std::io::Result<CommandOutput> {
        debug!(command = %invocation.command_line(), "ProcessRunner::run: called");

        // Killed if the caller stops waiting (timeout)
        let mut cmd = Command::from(Self::command(invocation, env));
        let output = cmd.kill_on_drop(true).output().await?;
        debug!(status = ?output.status, "ProcessRunner::run: process exited");

        Ok(CommandOutput {
            exit_code: output.status.code(),
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    async fn launch(&self, invocation: &Invocation, env: &ToolEnvironment) -> std::io::Result<()> {
        debug!(command = %invocation.command_line(), "ProcessRunner::launch: called");

        let mut detached = Self::command(invocation, env);
        detached.stdout(Stdio::null()).stderr(Stdio::null());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            detached.process_group(0);
        }
        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            detached.creation_flags(0x0000_0008); // DETACHED_PROCESS
        }

        let child = Command::from(detached).spawn()?;
        debug!(pid = ?child.id(), "ProcessRunner::launch: spawned");

        // Dropping the handle leaves the child running; tokio reaps it in the background
        drop(child);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_line() {
        let inv = Invocation::new("cite2md", ["--cat", "davidson:1963"]);
        assert_eq!(inv.command_line(), "cite2md --cat davidson:1963");

        let inv = Invocation::new("rg-sources", Vec::<String>::new());
        assert_eq!(inv.command_line(), "rg-sources");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout_and_status() {
        let env = ToolEnvironment::capture();
        let out = ProcessRunner
            .run(&Invocation::new("sh", ["-c", "echo hello; echo oops >&2; exit 3"]), &env)
            .await
            .unwrap();

        assert!(!out.success);
        assert_eq!(out.exit_code, Some(3));
        assert_eq!(out.stdout, "hello\n");
        assert_eq!(out.stderr, "oops\n");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_uses_given_environment_only() {
        let env = ToolEnvironment::capture()
            .with_var("CITEKIT_RUNNER_TEST", "present")
            .with_papers_dir("/papers");
        let out = ProcessRunner
            .run(
                &Invocation::new("sh", ["-c", "printf '%s|%s' \"$CITEKIT_RUNNER_TEST\" \"$PAPERS_DIR\""]),
                &env,
            )
            .await
            .unwrap();

        assert!(out.success);
        assert_eq!(out.stdout, "present|/papers");
    }

    #[tokio::test]
    async fn test_run_missing_program_is_not_found() {
        let env = ToolEnvironment::capture();
        let err = ProcessRunner
            .run(&Invocation::new("citekit-no-such-tool-9f3a", ["x"]), &env)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_launch_does_not_wait() {
        let env = ToolEnvironment::capture();
        let started = std::time::Instant::now();
        ProcessRunner
            .launch(&Invocation::new("sleep", ["5"]), &env)
            .await
            .unwrap();

        assert!(started.elapsed() < std::time::Duration::from_secs(3));
    }

    #[tokio::test]
    async fn test_launch_missing_program_fails() {
        let env = ToolEnvironment::capture();
        let err = ProcessRunner
            .launch(&Invocation::new("citekit-no-such-tool-9f3a", ["x"]), &env)
            .await
            .unwrap_err();

        assert_eq!(err.kind(), std::io::ErrorKind::NotFound);
    }
}
