//! Error types for the sandbox

use thiserror::Error;

/// Errors raised while reading or writing through a cursor
#[derive(Debug, Error)]
pub enum CursorError {
    /// The path steps into a value that has no children of that sort
    #[error("cannot address `{segment}` inside a value of type `{found}`")]
    TypeMismatch { segment: String, found: &'static str },

    /// List index past the end (appending at the end is allowed)
    #[error("index {index} is out of bounds for a list of length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// Nothing exists at the given path
    #[error("no value at `{0}`")]
    Missing(String),

    /// The root cannot be removed from its parent
    #[error("the root value cannot be removed")]
    Root,

    /// A list edit was applied to something that is not a list
    #[error("`{0}` does not address a list")]
    NotAList(String),
}

/// Errors that can occur during sandbox operations
#[derive(Debug, Error)]
pub enum SandboxError {
    /// Component not found in the registry
    #[error("Component not found: {0}")]
    ComponentNotFound(String),

    /// An operation needs a selected component
    #[error("No component is selected")]
    NoComponentSelected,

    /// Fixtures for the selected component have not loaded yet
    #[error("Fixtures for `{0}` are not loaded")]
    FixturesNotLoaded(String),

    /// Fixture instance index out of range
    #[error("Fixture instance {index} does not exist ({len} instances)")]
    InstanceOutOfRange { index: usize, len: usize },

    /// A component's prop declaration could not be turned into a validator
    #[error("Invalid declaration for prop `{prop}`: {reason}")]
    InvalidDeclaration { prop: String, reason: String },

    /// Cursor read/write error
    #[error("Cursor error: {0}")]
    Cursor(#[from] CursorError),
}
