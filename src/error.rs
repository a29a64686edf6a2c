/// Error types for content loading and the game loop.
///
/// Only loading can fail: a missing texture or a malformed level aborts the
/// load with a message naming the offending path, level or layer. The
/// per-tick simulation itself never returns errors.

use std::io;
use std::path::PathBuf;

/// Umbrella error for anything the orchestrator or host loop can hit.
#[derive(thiserror::Error, Debug)]
pub enum GameError {
    #[error("Asset error: {0}")]
    Asset(#[from] AssetError),

    #[error("Level error: {0}")]
    Level(#[from] LevelError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Texture lookup and manifest failures.
#[derive(thiserror::Error, Debug)]
pub enum AssetError {
    #[error("Texture not found: {0}")]
    NotFound(String),

    #[error("Could not read asset manifest {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid asset manifest: {0}")]
    Manifest(String),
}

/// Tile-map loading failures. Every variant names the level it came from.
#[derive(thiserror::Error, Debug)]
pub enum LevelError {
    #[error("Level {level} not found")]
    NotFound { level: u32 },

    #[error("Could not read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Level {level}: parse failed: {message}")]
    Parse { level: u32, message: String },

    #[error("Level {level}: unknown layer '{layer}'")]
    UnknownLayer { level: u32, layer: String },

    #[error("Level {level}: row {row} is {found} tiles wide, expected {expected}")]
    BadGrid {
        level: u32,
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Level {level}: no legend entry for tile '{tile}'")]
    UnknownTile { level: u32, tile: char },

    #[error("Level {level}: {layer} entity is missing property '{property}'")]
    MissingProperty {
        level: u32,
        layer: &'static str,
        property: &'static str,
    },

    #[error("Level {level}: {layer} property '{property}' is invalid: {reason}")]
    InvalidProperty {
        level: u32,
        layer: &'static str,
        property: &'static str,
        reason: String,
    },
}

pub type GameResult<T> = Result<T, GameError>;
