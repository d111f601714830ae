// ABOUTME: Image entity: build, existence check, inspection, removal.
// ABOUTME: Build streams the Dockerfile over stdin and the output back line by line.

use std::pin::Pin;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::Stream;
use thiserror::Error;

use super::cli::{Engine, stderr_of};
use super::output::OutputLines;
use super::timestamp::parse_created;
use crate::types::ImageRef;

/// Errors from image operations.
///
/// `List`, `Inspect` and `Remove` carry the engine's diagnostic stream.
/// `Build` carries no payload: its diagnostics have already been streamed
/// line by line before the failure surfaces.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("listing images failed: {0}")]
    List(String),

    #[error("inspecting image failed: {0}")]
    Inspect(String),

    #[error("image build failed")]
    Build,

    #[error("removing image failed: {0}")]
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

/// Handle to a named, tagged image.
///
/// Constructing one performs no engine call and destroying one removes
/// nothing; whether the artifact exists is re-queried on every ask.
#[derive(Debug, Clone)]
pub struct Image {
    engine: Engine,
    reference: ImageRef,
}

impl Image {
    pub fn new(reference: ImageRef) -> Self {
        Self::with_engine(Engine::default(), reference)
    }

    pub fn with_engine(engine: Engine, reference: ImageRef) -> Self {
        Self { engine, reference }
    }

    pub fn name(&self) -> &str {
        self.reference.name()
    }

    pub fn tag(&self) -> &str {
        self.reference.tag()
    }

    pub fn reference(&self) -> &ImageRef {
        &self.reference
    }

    pub(crate) fn engine(&self) -> &Engine {
        &self.engine
    }

    /// Whether an image with this reference exists in the engine.
    pub async fn is_built(&self) -> Result<bool, ImageError> {
        let output = self.engine.run(&self.list_args()).await?;
        if !output.status.success() {
            return Err(ImageError::List(stderr_of(&output)));
        }

        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
    }

    /// Creation timestamp of the built image.
    pub async fn build_date(&self) -> Result<DateTime<Utc>, ImageError> {
        let output = self.engine.run(&self.inspect_args()).await?;
        if !output.status.success() {
            return Err(ImageError::Inspect(stderr_of(&output)));
        }

        let value = String::from_utf8_lossy(&output.stdout).trim().to_string();
        parse_created(&value).map_err(|source| ImageError::Timestamp { value, source })
    }

    /// Build the image from an in-memory Dockerfile with no build context.
    ///
    /// The Dockerfile travels over the engine's stdin, which is then closed
    /// to signal end-of-input. The returned stream yields merged build
    /// output lines in arrival order; [`BuildStream::finish`] resolves the
    /// outcome once the build exits.
    pub fn build(&self, dockerfile: &[u8]) -> Result<BuildStream, ImageError> {
        tracing::info!("building image {}", self.reference);
        let lines = self
            .engine
            .stream(&self.build_args(), Some(dockerfile.to_vec()))?;

        Ok(BuildStream { lines })
    }

    /// Remove the image from the engine.
    pub async fn remove(&self) -> Result<(), ImageError> {
        let output = self.engine.run(&self.remove_args()).await?;
        if !output.status.success() {
            return Err(ImageError::Remove(stderr_of(&output)));
        }

        Ok(())
    }

    fn list_args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "ls".to_string(),
            "--filter".to_string(),
            format!("reference={}", self.reference),
            "--format".to_string(),
            "{{.Repository}}:{{.Tag}}".to_string(),
        ]
    }

    fn inspect_args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "inspect".to_string(),
            "--format".to_string(),
            "{{.Created}}".to_string(),
            self.reference.to_string(),
        ]
    }

    fn build_args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "build".to_string(),
            "--tag".to_string(),
            self.reference.to_string(),
            "-".to_string(),
        ]
    }

    fn remove_args(&self) -> Vec<String> {
        vec![
            "image".to_string(),
            "rm".to_string(),
            self.reference.to_string(),
        ]
    }
}

/// Streaming output of an in-flight image build.
pub struct BuildStream {
    lines: OutputLines,
}

impl BuildStream {
    /// Next build output line, or `None` at end of stream.
    pub async fn next_line(&mut self) -> Option<String> {
        self.lines.next_line().await
    }

    /// Wait for the build to exit and classify the outcome.
    pub async fn finish(self) -> Result<(), ImageError> {
        let status = self.lines.wait().await?;
        if status.success() {
            Ok(())
        } else {
            tracing::warn!("image build exited with {status}");
            Err(ImageError::Build)
        }
    }
}

impl Stream for BuildStream {
    type Item = String;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        Pin::new(&mut self.lines).poll_next(cx)
    }
}
