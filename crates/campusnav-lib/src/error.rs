use thiserror::Error;

/// Convenient result alias for the campus navigation library.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level library error type.
#[derive(Debug, Error)]
pub enum Error {
    /// The map source did not contain a bounds polygon.
    #[error("map contains no 'Bounds' polygon")]
    MissingBounds,

    /// The map source contained more than one bounds polygon.
    #[error("map contains {count} 'Bounds' polygons, expected exactly one")]
    MultipleBounds { count: usize },

    /// A feature geometry could not be used to build the grid.
    #[error("malformed geometry: {detail}")]
    MalformedGeometry { detail: String },

    /// No walkable cell could be found near a requested point.
    #[error("no walkable cell found near grid cell ({row}, {col})")]
    ResolutionFailure { row: usize, col: usize },

    /// Wrapper for IO errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapper for JSON serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
