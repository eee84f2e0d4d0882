use std::io;
use std::path::PathBuf;

use lyon::tessellation::TessellationError;
use thiserror::Error;

/// Errors raised while reading a typeface file
#[derive(Debug, Error)]
pub enum FontError {
    #[error("cannot read font file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed typeface json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid outline for glyph '{glyph}': {reason}")]
    Outline { glyph: char, reason: String },
}

/// Errors raised while turning glyph outlines into a mesh
#[derive(Debug, Error)]
pub enum TextError {
    #[error(transparent)]
    Font(#[from] FontError),
    #[error("cap tessellation failed: {0:?}")]
    Tessellation(TessellationError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PlacementError {
    #[error("no disjoint placement found after {attempts} attempts")]
    Exhausted { attempts: u32 },
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("terminal i/o failed: {0}")]
    Io(#[from] io::Error),
    #[error("cannot open log file {}: {source}", path.display())]
    LogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}
