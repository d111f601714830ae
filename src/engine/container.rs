// ABOUTME: Container entity: create, start, stop, exec, inspection, removal.
// ABOUTME: Identity is the name; the bound image is only read when creating.

use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::Stream;
use thiserror::Error;

use super::cli::{Engine, stderr_of};
use super::image::Image;
use super::output::OutputLines;
use super::timestamp::parse_created;
use crate::types::{ContainerName, ImageRef};

/// How long the engine waits for a container before killing it on stop,
/// in seconds.
const STOP_TIMEOUT_SECS: u32 = 1;

/// Errors from container operations.
///
/// Same payload policy as [`ImageError`](super::ImageError): captured
/// operations carry the diagnostic stream, `Exec` carries only the kind
/// because its diagnostics were already streamed.
#[derive(Debug, Error)]
pub enum ContainerError {
    #[error("listing containers failed: {0}")]
    List(String),

    #[error("inspecting container failed: {0}")]
    Inspect(String),

    #[error("creating container failed: {0}")]
    Create(String),

    #[error("starting container failed: {0}")]
    Start(String),

    #[error("stopping container failed: {0}")]
    Stop(String),

    #[error("command execution failed")]
    Exec,

    #[error("removing container failed: {0}")]
    Remove(String),

    #[error("unparseable creation timestamp {value:?}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("failed to invoke container engine: {0}")]
    Engine(#[from] std::io::Error),
}

/// Handle to a named container bound to the image it is created from.
///
/// Symmetric to [`Image`]: in-process construction does nothing, and
/// existence is re-queried against the engine on every ask. The bound
/// image is informational for `create` only; it is never re-validated
/// against what the engine thinks the container was created from.
#[derive(Debug, Clone)]
pub struct Container {
    engine: Engine,
    name: ContainerName,
    image: ImageRef,
}

impl Container {
    /// Bind a container name to an image. The engine handle is inherited
    /// from the image.
    pub fn new(name: ContainerName, image: &Image) -> Self {
        Self {
            engine: image.engine().clone(),
            name,
            image: image.reference().clone(),
        }
    }

    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    pub fn image(&self) -> &ImageRef {
        &self.image
    }

    /// Whether a container with exactly this name exists, in any state.
    ///
    /// The engine's `name` filter matches substrings, so every listed
    /// name is compared for equality.
    pub async fn is_created(&self) -> Result<bool, ContainerError> {
        let output = self.engine.run(&self.list_args(true)).await?;
        if !output.status.success() {
            return Err(ContainerError::List(stderr_of(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.listed_exactly(&stdout))
    }

    /// Whether a container with exactly this name is currently running.
    pub async fn is_started(&self) -> Result<bool, ContainerError> {
        let output = self.engine.run(&self.list_args(false)).await?;
        if !output.status.success() {
            return Err(ContainerError::List(stderr_of(&output)));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(self.listed_exactly(&stdout))
    }

    /// Creation timestamp of the container.
    pub async fn creation_date(&self) -> Result<DateTime<Utc>, ContainerError> {
        let output = self.engine.run(&self.inspect_args()).await?;
        if !output.status.success() {
            return Err(ContainerError::Inspect(stderr_of(&output)));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        parse_created(&value).map_err(|source| ContainerError::Timestamp { value, source })
    }

    /// Create the container from the bound image, without starting it.
    pub async fn create(&self) -> Result<(), ContainerError> {
        let output = self.engine.run(&self.create_args()).await?;
        if !output.status.success() {
            return Err(ContainerError::Create(stderr_of(&output)));
        }

        Ok(())
    }

    /// Start the created container.
    pub async fn start(&self) -> Result<(), ContainerError> {
        let output = self.engine.run(&self.start_args()).await?;
        if !output.status.success() {
            return Err(ContainerError::Start(stderr_of(&output)));
        }

        Ok(())
    }

    /// Stop the running container.
    pub async fn stop(&self) -> Result<(), ContainerError> {
        let output = self.engine.run(&self.stop_args()).await?;
        if !output.status.success() {
            return Err(ContainerError::Stop(stderr_of(&output)));
        }

        Ok(())
    }

    /// Run a command inside the running container.
    ///
    /// The returned stream yields merged output lines in arrival order;
    /// [`ExecStream::finish`] resolves the outcome once the command exits.
    pub fn exec(&self, command: &[&str]) -> Result<ExecStream, ContainerError> {
        let lines = self.engine.stream(&self.exec_args(command), None)?;

        Ok(ExecStream { lines })
    }

    /// Remove the container from the engine.
    pub async fn remove(&self) -> Result<(), ContainerError> {
        let output = self.engine.run(&self.remove_args()).await?;
        if !output.status.success() {
            return Err(ContainerError::Remove(stderr_of(&output)));
        }

        Ok(())
    }

    fn listed_exactly(&self, stdout: &str) -> bool {
        stdout
            .lines()
            .any(|listed| listed.trim() == self.name.as_str())
    }

    fn list_args(&self, all: bool) -> Vec<String> {
        let mut args = vec!["container".to_string(), "ls".to_string()];
        if all {
            args.push("--all".to_string());
        }
        args.extend([
            "--filter".to_string(),
            format!("name={}", self.name),
            "--format".to_string(),
            "{{.Names}}".to_string(),
        ]);
        args
    }

    fn inspect_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Created}}".to_string(),
            self.name.to_string(),
        ]
    }

    fn create_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "create".to_string(),
            "--name".to_string(),
            self.name.to_string(),
            self.image.to_string(),
        ]
    }

    fn start_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "start".to_string(),
            self.name.to_string(),
        ]
    }

    fn stop_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "stop".to_string(),
            "--time".to_string(),
            STOP_TIMEOUT_SECS.to_string(),
            self.name.to_string(),
        ]
    }

    fn exec_args(&self, command: &[&str]) -> Vec<String> {
        let mut args = vec![
            "container".to_string(),
            "exec".to_string(),
            self.name.to_string(),
        ];
        args.extend(command.iter().map(|token| token.to_string()));
        args
    }

    fn remove_args(&self) -> Vec<String> {
        vec![
            "container".to_string(),
            "rm".to_string(),
            self.name.to_string(),
        ]
    }
}

/// Streaming output of a command running inside a container.
pub struct ExecStream {
    lines: OutputLines,
}

impl ExecStream {
    /// Next output line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.next_line().await
    }

    /// Wait for the command to exit and classify the outcome.
    pub async fn finish(self) -> Result<(), ContainerError> {
        let status = self.lines.wait().await?;
        if status.success() {
            Ok(())
        } else {
            tracing::warn!("exec exited with {status}");
            Err(ContainerError::Exec)
        }
    }
}

impl Stream for ExecStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.lines).poll_next(cx)
    }
}
