// ABOUTME: Engine program selection and subprocess plumbing.
// ABOUTME: Runs captured commands and spawns streaming ones over piped channels.

use std::process::{Output, Stdio};

use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use super::output::OutputLines;

/// Errors from reaching the engine itself, before any image or container
/// operation gets to run.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to invoke {program}: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },

    #[error("{program} engine is not reachable: {stderr}")]
    Unreachable { program: String, stderr: String },

    #[error("no container engine found (checked docker and podman)")]
    NotFound,
}

/// The engine binary every operation is dispatched to.
///
/// Arguments are always passed as a discrete vector, never through a
/// shell, so names containing metacharacters cannot change command
/// semantics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Engine {
    program: String,
}

impl Default for Engine {
    fn default() -> Self {
        Self::docker()
    }
}

impl Engine {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn docker() -> Self {
        Self::new("docker")
    }

    pub fn podman() -> Self {
        Self::new("podman")
    }

    /// Honor the `SKAFOS_ENGINE` override, falling back to docker.
    pub fn from_env() -> Self {
        match std::env::var("SKAFOS_ENGINE") {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::docker(),
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Probe the engine.
    ///
    /// Distinguishes a missing binary from an engine that does not answer.
    /// docker exits non-zero here whenever its daemon is unreachable;
    /// daemonless podman answers from the client alone.
    pub async fn available(&self) -> Result<(), EngineError> {
        let args = [
            "version".to_string(),
            "--format".to_string(),
            "{{.Client.Version}}".to_string(),
        ];
        let output = self.run(&args).await.map_err(|source| EngineError::Spawn {
            program: self.program.clone(),
            source,
        })?;

        if output.status.success() {
            Ok(())
        } else {
            Err(EngineError::Unreachable {
                program: self.program.clone(),
                stderr: stderr_of(&output),
            })
        }
    }

    /// Detect a usable engine, docker first, then podman.
    pub async fn detect() -> Result<Self, EngineError> {
        for engine in [Self::docker(), Self::podman()] {
            if engine.available().await.is_ok() {
                return Ok(engine);
            }
        }

        Err(EngineError::NotFound)
    }

    /// Run a captured invocation and wait for it to exit.
    pub(crate) async fn run(&self, args: &[String]) -> std::io::Result<Output> {
        tracing::debug!("running {} {}", self.program, args.join(" "));

        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
    }

    /// Spawn a streaming invocation with merged stdout/stderr lines.
    ///
    /// When `stdin` carries a payload, a detached task writes it and closes
    /// the pipe to signal end-of-input.
    pub(crate) fn stream(
        &self,
        args: &[String],
        stdin: Option<Vec<u8>>,
    ) -> std::io::Result<OutputLines> {
        tracing::debug!("streaming {} {}", self.program, args.join(" "));

        let mut child = Command::new(&self.program)
            .args(args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        if let Some(payload) = stdin {
            let mut pipe = child.stdin.take().expect("stdin was piped");
            tokio::spawn(async move {
                // The engine may exit before reading everything.
                let _ = pipe.write_all(&payload).await;
                let _ = pipe.shutdown().await;
            });
        }

        Ok(OutputLines::new(child))
    }
}

/// Trimmed, lossily decoded diagnostic stream of a finished command.
pub(crate) fn stderr_of(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).trim().to_string()
}
