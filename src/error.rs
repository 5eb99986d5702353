use thiserror::Error;

/// Represents an error that occurs while scanning source text.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ScanError {
    pub message: String,
}

impl ScanError {
    pub fn new(message: impl Into<String>) -> Self {
        ScanError { message: message.into() }
    }
}

/// Represents an error that occurs while parsing tokens.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError { message: message.into() }
    }
}

/// Represents an error that occurs while evaluating a program.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct RuntimeError {
    pub message: String,
}

impl RuntimeError {
    pub fn new(message: impl Into<String>) -> Self {
        RuntimeError { message: message.into() }
    }
}

/// Any failure a run can surface. Every stage reports exactly one of these
/// and the driver prints it as a single diagnostic line.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
    #[error("failed to read source file: \"{path}\"")]
    Source { path: String },
}
