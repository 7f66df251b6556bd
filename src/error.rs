use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Error raised while expanding run-length encoded board text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RleError {
    /// A `(` that is never closed.
    #[error("unbalanced group opened at column {column}")]
    UnbalancedGroup { column: usize },
    /// A `)` with no matching `(`.
    #[error("unexpected ')' at column {column}")]
    UnexpectedClose { column: usize },
    /// A repeat count whose expansion is far larger than any board.
    #[error("repeat count at column {column} expands the line too far")]
    CountTooLarge { column: usize },
}

/// Error raised when a board layout cannot form a level.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LevelError {
    #[error("board holds {tiles} tiles, expected {rows}x{columns}")]
    SizeMismatch {
        rows: usize,
        columns: usize,
        tiles: usize,
    },
    #[error("player at cell {player} does not stand on floor")]
    PlayerNotOnFloor { player: usize },
}

/// Error type for level parsing operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A board line whose run-length encoding is structurally broken.
    #[error("line {line}: {source}")]
    Rle {
        line: usize,
        #[source]
        source: RleError,
    },
    /// A board block that does not describe a playable level. Such boards
    /// are skipped by `parse_levels`.
    #[error("invalid level {level}: {reason}")]
    InvalidLevel { level: usize, reason: String },
    /// The input held no board lines at all.
    #[error("no parseable levels found in input")]
    NoLevels,
}

/// Error raised while validating probability configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbabilityError {
    #[error("invalid probability '{0}': expected <key>=<value>")]
    Malformed(String),
    #[error("invalid probability '{0}': unknown key, expected one of u, d, l, r, b")]
    UnknownKey(String),
    #[error("probability with key '{0}' defined multiple times")]
    DuplicateKey(char),
    #[error("invalid probability '{0}': value is not a decimal number")]
    InvalidValue(String),
    #[error("invalid probability '{0}': value is negative")]
    Negative(String),
    #[error("probabilities sum to zero")]
    ZeroSum,
    #[error("mu must lie in [0, 1], got {0}")]
    MuOutOfRange(String),
}

/// Error raised while rendering a model.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("failed to serialize model: {0}")]
    Json(#[from] serde_json::Error),
    #[error("decimal {0} has no JSON number representation")]
    Numeric(String),
}

/// Error raised while placing generated models.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("failed to write '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("file '{}' already exists", path.display())]
    Collision { path: PathBuf },
    #[error("can only write one model to stdout, input holds {levels} levels")]
    AmbiguousStdout { levels: usize },
    #[error(transparent)]
    Generate(#[from] GenerateError),
}
