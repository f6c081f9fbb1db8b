//! Error types for every layer of the crate.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Contract violations of the field engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// A field was requested with a zero-length side, or built from empty or ragged rows.
    #[error("invalid field dimensions {size_x}x{size_y}")]
    InvalidDimension { size_x: usize, size_y: usize },

    /// A raw cell state outside of `0` (dead) and `1` (alive).
    #[error("invalid cell state {0}, expected 0 (dead) or 1 (alive)")]
    InvalidState(u32),

    #[error("cell ({x}, {y}) is outside of the {size_x}x{size_y} field")]
    OutOfBounds {
        x: usize,
        y: usize,
        size_x: usize,
        size_y: usize,
    },
}

/// Failures of the save file codec.
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("save data is empty")]
    Empty,

    /// Position is 1-based.
    #[error("malformed save data at line {line}, column {column}: unexpected {found:?}")]
    Malformed {
        line: usize,
        column: usize,
        found: char,
    },

    #[error("malformed save data: line {line} has {found} cells, expected {expected}")]
    Ragged {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("cannot access save file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Field(#[from] FieldError),
}

/// Failures of the settings file store.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("wrong settings file formatting at line {line} (is it a settings file?)")]
    WrongFormatting { line: usize },

    #[error("setting {0:?} not found")]
    NotFound(String),

    #[error("invalid value {value:?} for setting {key:?}")]
    InvalidValue { key: String, value: String },

    #[error("cannot access settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Any error the crate can produce.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Field(#[from] FieldError),

    #[error(transparent)]
    Save(#[from] SaveError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("terminal error: {0}")]
    Terminal(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
