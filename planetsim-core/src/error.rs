use std::path::PathBuf;

use thiserror::Error;

use crate::location::ParameterKind;
use crate::world::GlobalParameterKind;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("coordinate ({x}, {y}) is outside the {dimensions}x{dimensions} grid")]
    CoordinateOutOfBounds {
        x: usize,
        y: usize,
        dimensions: usize,
    },
    #[error("coordinate ({x}, {y}) is not on any latitude line")]
    MissingLatitudeLine { x: usize, y: usize },
    #[error("global parameter {0:?} is derived and cannot be set directly")]
    DerivedParameter(GlobalParameterKind),
    #[error("world dimensions must be at least 1, got {0}")]
    InvalidDimensions(usize),
    #[error("star distance must be positive and finite, got {0}")]
    InvalidStarDistance(f64),
    #[error("{parameter:?} smoothing did not settle after {sweeps} sweeps")]
    Smoothing {
        parameter: ParameterKind,
        sweeps: usize,
    },
}

#[derive(Debug, Error)]
pub enum TuningError {
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read tuning from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to parse snapshot: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("failed to serialize snapshot: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to read snapshot from {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write snapshot to {path:?}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("snapshot layer `{layer}` has {found} cells, expected {expected}")]
    DimensionMismatch {
        layer: String,
        expected: usize,
        found: usize,
    },
    #[error(transparent)]
    World(#[from] WorldError),
}
