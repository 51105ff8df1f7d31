//! External command execution.
//!
//! Every git and docker invocation goes through [`CommandRunner`] so the
//! pipelines only depend on the textual stdout / exit code contract of the
//! tools, and tests can script those outputs.
use async_trait::async_trait;
use log::*;
use secrecy::{ExposeSecret, SecretString};
use std::{fmt, process::Stdio};
use tokio::{io::AsyncWriteExt, process::Command};

use crate::error::{AutoshipError, Result};

/// A single program invocation.
#[derive(Debug, Clone)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    /// Written to the child's stdin, then stdin is closed.
    pub stdin: Option<SecretString>,
}

impl CommandSpec {
    pub fn new<I, S>(program: &str, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.to_string(),
            args: args.into_iter().map(Into::into).collect(),
            stdin: None,
        }
    }

    pub fn with_stdin(mut self, input: SecretString) -> Self {
        self.stdin = Some(input);
        self
    }

    /// True when the invocation is `program args...` exactly.
    pub fn is(&self, program: &str, args: &[&str]) -> bool {
        self.program == program
            && self.args.iter().map(String::as_str).eq(args.iter().copied())
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in self.args.iter() {
            if arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

/// Captured result of a finished process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal.
    pub code: Option<i32>,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into [`AutoshipError::CommandFailed`].
    pub fn check(self, spec: &CommandSpec) -> Result<Self> {
        if self.success() {
            return Ok(self);
        }

        Err(AutoshipError::CommandFailed {
            command: spec.to_string(),
            code: self.code,
            stderr: self.stderr.trim().to_string(),
        })
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run the command to completion. A non-zero exit is *not* an error at
    /// this level; only a failure to spawn is.
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput>;
}

/// Runs commands as real child processes in the current directory.
#[derive(Debug, Default)]
pub struct SystemRunner;

#[async_trait]
impl CommandRunner for SystemRunner {
    async fn run(&self, spec: &CommandSpec) -> Result<CommandOutput> {
        debug!("running: {spec}");

        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if spec.stdin.is_some() {
            command.stdin(Stdio::piped());
        } else {
            command.stdin(Stdio::null());
        }

        let mut child = command.spawn().map_err(|err| {
            if err.kind() == std::io::ErrorKind::NotFound {
                AutoshipError::environment(format!(
                    "{} is not installed or not on PATH",
                    spec.program
                ))
            } else {
                AutoshipError::Io(err)
            }
        })?;

        if let Some(input) = spec.stdin.as_ref()
            && let Some(mut stdin) = child.stdin.take()
        {
            let written = async {
                stdin.write_all(input.expose_secret().as_bytes()).await?;
                stdin.shutdown().await
            }
            .await;

            // The child may exit without reading stdin; its exit code and
            // stderr are what matter then.
            match written {
                Err(err) if err.kind() == std::io::ErrorKind::BrokenPipe => {
                    debug!("{} closed stdin early", spec.program);
                }
                other => other?,
            }
        }

        let output = child.wait_with_output().await?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            code: output.status.code(),
        };

        debug!("{} exited with {:?}", spec.program, result.code);

        Ok(result)
    }
}
