// ABOUTME: Unified error with SNAFU pattern.
// ABOUTME: Collapses image, container and engine failures for programmatic handling.

use snafu::Snafu;

use crate::engine::{ContainerError, EngineError, ImageError};

/// Unified error over the per-entity operation errors.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    #[snafu(display("image operation failed: {source}"))]
    Image { source: ImageError },

    #[snafu(display("container operation failed: {source}"))]
    Container { source: ContainerError },

    #[snafu(display("engine unavailable: {source}"))]
    Engine { source: EngineError },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A listing command exited non-zero.
    List,
    /// An inspect command exited non-zero.
    Inspect,
    /// An image build exited non-zero.
    Build,
    /// Container creation exited non-zero.
    Create,
    /// Starting a container exited non-zero.
    Start,
    /// Stopping a container exited non-zero.
    Stop,
    /// A command executed in a container exited non-zero.
    Exec,
    /// A remove command exited non-zero.
    Remove,
    /// The engine reported an unparseable creation timestamp.
    Timestamp,
    /// The engine binary could not be invoked at all.
    Invocation,
    /// No reachable engine daemon.
    Unavailable,
}

impl Error {
    /// Returns the error kind for programmatic handling.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Image { source } => match source {
                ImageError::List(_) => ErrorKind::List,
                ImageError::Inspect(_) => ErrorKind::Inspect,
                ImageError::Build => ErrorKind::Build,
                ImageError::Remove(_) => ErrorKind::Remove,
                ImageError::Timestamp { .. } => ErrorKind::Timestamp,
                ImageError::Engine(_) => ErrorKind::Invocation,
            },
            Error::Container { source } => match source {
                ContainerError::List(_) => ErrorKind::List,
                ContainerError::Inspect(_) => ErrorKind::Inspect,
                ContainerError::Create(_) => ErrorKind::Create,
                ContainerError::Start(_) => ErrorKind::Start,
                ContainerError::Stop(_) => ErrorKind::Stop,
                ContainerError::Exec => ErrorKind::Exec,
                ContainerError::Remove(_) => ErrorKind::Remove,
                ContainerError::Timestamp { .. } => ErrorKind::Timestamp,
                ContainerError::Engine(_) => ErrorKind::Invocation,
            },
            Error::Engine { source } => match source {
                EngineError::Spawn { .. } => ErrorKind::Invocation,
                EngineError::Unreachable { .. } | EngineError::NotFound => ErrorKind::Unavailable,
            },
        }
    }

    /// Returns the engine's diagnostic stream, for the kinds that carry one.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            Error::Image { source } => match source {
                ImageError::List(stderr)
                | ImageError::Inspect(stderr)
                | ImageError::Remove(stderr) => Some(stderr),
                _ => None,
            },
            Error::Container { source } => match source {
                ContainerError::List(stderr)
                | ContainerError::Inspect(stderr)
                | ContainerError::Create(stderr)
                | ContainerError::Start(stderr)
                | ContainerError::Stop(stderr)
                | ContainerError::Remove(stderr) => Some(stderr),
                _ => None,
            },
            Error::Engine { source } => match source {
                EngineError::Unreachable { stderr, .. } => Some(stderr),
                _ => None,
            },
        }
    }
}

impl From<ImageError> for Error {
    fn from(source: ImageError) -> Self {
        Error::Image { source }
    }
}

impl From<ContainerError> for Error {
    fn from(source: ContainerError) -> Self {
        Error::Container { source }
    }
}

impl From<EngineError> for Error {
    fn from(source: EngineError) -> Self {
        Error::Engine { source }
    }
}
